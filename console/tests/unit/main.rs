//! Integration tests for the deployment console

mod test_driver_provider;
mod test_fsm;
mod test_storage;
mod test_subscription;
