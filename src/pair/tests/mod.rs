
#[cfg(test)]
mod limit_order_tests;
