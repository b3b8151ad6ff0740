//! Custom assertion macros and utilities
//!
//! Provides assertion macros with more descriptive failure output.

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $message:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $message, e),
        }
    };
}

/// Assert that a string contains a substring
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        assert!(
            $haystack.contains($needle),
            "Expected '{}' to contain '{}'",
            $haystack,
            $needle
        );
    };
}

/// Assert that a GraphQL response has no errors and return its `data`
#[macro_export]
macro_rules! assert_graphql_ok {
    ($response:expr) => {{
        let response = $response;
        assert!(
            response.get("errors").is_none(),
            "Expected no GraphQL errors, got: {}",
            response["errors"]
        );
        response["data"].clone()
    }};
}
