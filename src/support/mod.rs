pub mod errors;
pub mod ocpp_frame;
pub mod shutdown;

#[cfg(test)]
pub mod test_support;
