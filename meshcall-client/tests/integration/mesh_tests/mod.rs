pub mod test_failure_isolation;
