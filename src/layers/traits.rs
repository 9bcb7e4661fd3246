use crate::blob::Blob;
use crate::error::Result;

/// Trait defining the contract between a layer and the graph runtime that drives it.
///
/// Bottom blobs are the layer's inputs and top blobs its outputs. The runtime
/// owns every blob; layers only borrow them for the duration of a call.
pub trait Layer: Send + Sync {
    /// Name the layer is registered under
    fn layer_type(&self) -> &'static str;

    /// Validate the bottom shapes and return the shape of each top blob
    fn setup(&mut self, bottom_shapes: &[&[usize]], num_top: usize) -> Result<Vec<Vec<usize>>>;

    /// Compute top data from bottom data
    fn forward(&self, bottom: &[Blob], top: &mut [Blob]) -> Result<()>;

    /// Compute bottom diffs from top diffs for every bottom whose
    /// `propagate_down` entry asks for it
    fn backward(&self, top: &[Blob], propagate_down: &[bool], bottom: &mut [Blob]) -> Result<()>;

    /// Clone the layer into a boxed trait object
    fn clone_box(&self) -> Box<dyn Layer>;

    /// Run [`Layer::setup`] on the bottom blobs and reshape the tops to match
    fn setup_blobs(&mut self, bottom: &[Blob], top: &mut [Blob]) -> Result<()> {
        let bottom_shapes: Vec<&[usize]> = bottom.iter().map(Blob::shape).collect();
        let top_shapes = self.setup(&bottom_shapes, top.len())?;
        for (blob, shape) in top.iter_mut().zip(&top_shapes) {
            blob.reshape(shape);
        }
        Ok(())
    }
}

impl Clone for Box<dyn Layer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
