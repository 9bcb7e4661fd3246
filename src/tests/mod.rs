pub mod test_registry;
