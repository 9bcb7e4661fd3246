pub mod traits;
pub mod joint_to_conditional;
pub mod registry;

pub use traits::Layer as LayerTrait;
pub use joint_to_conditional::JointToConditionalLayer;
pub use registry::{LayerCreator, LayerRegistry};
