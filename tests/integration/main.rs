mod http_tests;
mod pool_tests;
mod support;
