//! A high-performance JSON Schema validator for Rust.
//!
//! - 📚 Support for popular JSON Schema drafts
//! - 🔧 Custom keywords and format validators
//! - 🌐 Remote reference fetching (network/file)
//! - 🎨 `flag`, `basic`, `detailed`, and `verbose` output styles as per JSON Schema spec
//! - 🛑 Cooperative cancellation for long-running validation
//!
//! ## Supported drafts
//!
//! Compliance levels vary across drafts, with newer versions having some unimplemented keywords.
//!
//! - Draft 2020-12
//! - Draft 2019-09
//! - Draft 7
//! - Draft 6
//! - Draft 4
//!
//! # Validation
//!
//! The `schema_engine` crate offers two main approaches to validation: one-off validation and reusable validators.
//!
//! ## One-off Validation
//!
//! For simple use cases where you need to validate an instance against a schema once, use the `is_valid` function:
//!
//! ```rust
//! use serde_json::json;
//!
//! let schema = json!({"type": "string"});
//! let instance = json!("Hello, world!");
//!
//! assert!(schema_engine::is_valid(&schema, &instance));
//! ```
//!
//! ## Reusable Validators
//!
//! For better performance, especially when validating multiple instances against the same schema, build a validator once and reuse it:
//!
//! ```rust
//! use serde_json::json;
//!
//! let schema = json!({"type": "string"});
//! let validator = schema_engine::validator_for(&schema)
//!     .expect("Invalid schema");
//!
//! assert!(validator.is_valid(&json!("Hello, world!")));
//! assert!(!validator.is_valid(&json!(42)));
//!
//! // Iterate over all errors
//! let instance = json!(42);
//! let result = validator.validate(&instance);
//! if let Err(errors) = result {
//!     for error in errors {
//!         eprintln!("Error: {}", error);
//!         eprintln!("Location: {}", error.instance_path);
//!     }
//! }
//! ```
//!
//! # Configuration
//!
//! `schema_engine` provides a builder for configuration options via [`options()`].
//!
//! Here is how you can explicitly set the JSON Schema draft version:
//!
//! ```rust
//! use serde_json::json;
//!
//! let schema = json!({"type": "string"});
//! let validator = schema_engine::options()
//!     .with_draft(schema_engine::Draft::Draft7)
//!     .build(&schema)
//!     .expect("Invalid schema");
//! ```
//!
//! For a complete list of configuration options and their usage, please refer to the [`ValidationOptions`] struct.
//!
//! # Reference Resolving
//!
//! By default, `schema_engine` resolves HTTP references using `reqwest` and file references from the local file system.
//!
//! To enable HTTPS support, add the `rustls-tls` feature to `reqwest` in your `Cargo.toml`:
//!
//! ```toml
//! reqwest = { version = "*", features = ["rustls-tls"] }
//! ```
//!
//! You can disable the default behavior using crate features:
//!
//! - Disable HTTP resolving: `default-features = false, features = ["resolve-file"]`
//! - Disable file resolving: `default-features = false, features = ["resolve-http"]`
//! - Disable both: `default-features = false`
//!
//! You can implement a custom retriever to handle external references. Here's an example that uses a static map of schemas:
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::collections::HashMap;
//! use schema_engine::{Retrieve, Uri};
//! use serde_json::{json, Value};
//!
//! struct StaticRetriever {
//!     schemas: HashMap<String, Value>,
//! }
//!
//! impl Retrieve for StaticRetriever {
//!     fn retrieve(
//!         &self,
//!         uri: &Uri<&str>,
//!     ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
//!         self.schemas
//!             .get(uri.as_str())
//!             .cloned()
//!             .ok_or_else(|| format!("Schema not found: {uri}").into())
//!     }
//! }
//!
//! let mut schemas = HashMap::new();
//! schemas.insert(
//!     "https://example.com/person.json".to_string(),
//!     json!({
//!         "type": "object",
//!         "properties": {
//!             "name": { "type": "string" },
//!             "age": { "type": "integer" }
//!         },
//!         "required": ["name", "age"]
//!     }),
//! );
//!
//! let retriever = StaticRetriever { schemas };
//!
//! let schema = json!({
//!     "$ref": "https://example.com/person.json"
//! });
//!
//! let validator = schema_engine::options()
//!     .with_retriever(retriever)
//!     .build(&schema)
//!     .expect("Invalid schema");
//!
//! assert!(validator.is_valid(&json!({
//!     "name": "Alice",
//!     "age": 30
//! })));
//!
//! assert!(!validator.is_valid(&json!({
//!     "name": "Bob"
//! })));
//! #    Ok(())
//! # }
//! ```
//! # Output Styles
//!
//! `schema_engine` supports the `flag`, `basic`, `detailed`, and `verbose` output styles as
//! defined in JSON Schema Draft 2019-09 and 2020-12.
//! This allows you to serialize validation results in a standardized format using `serde`.
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use schema_engine::BasicOutput;
//! use serde_json::json;
//!
//! let schema_json = json!({
//!     "title": "string value",
//!     "type": "string"
//! });
//! let instance = json!("some string");
//! let validator = schema_engine::validator_for(&schema_json)
//!     .expect("Invalid schema");
//!
//! let output: BasicOutput = validator.apply(&instance).basic();
//! let output_json = serde_json::to_value(output)?;
//!
//! assert_eq!(
//!     output_json,
//!     json!({
//!         "valid": true,
//!         "annotations": [
//!             {
//!                 "keywordLocation": "",
//!                 "instanceLocation": "",
//!                 "annotations": {
//!                     "title": "string value"
//!                 }
//!             }
//!         ]
//!     })
//! );
//! #    Ok(())
//! # }
//! ```
//!
//! # Cancellation
//!
//! Long-running validation against a large or deeply recursive schema can be stopped from
//! another thread using a [`CancellationToken`]. The token is checked once per top-level
//! keyword of the root schema; a cancelled run returns a single error rather than a partial
//! list.
//!
//! ```rust
//! use schema_engine::CancellationToken;
//! use serde_json::json;
//!
//! let schema = json!({"type": "string"});
//! let validator = schema_engine::validator_for(&schema).expect("Invalid schema");
//! let token = CancellationToken::new();
//!
//! // Elsewhere: token.cancel();
//! assert!(validator
//!     .validate_with_cancellation(&json!("hello"), &token)
//!     .is_ok());
//! ```
//!
//! # Custom Keywords
//!
//! `schema_engine` allows you to extend its functionality by implementing custom validation logic through custom keywords.
//! This feature is particularly useful when you need to validate against domain-specific rules that aren't covered by the standard JSON Schema keywords.
//!
//! To implement a custom keyword, you need to:
//! 1. Create a struct that implements the `Keyword` trait
//! 2. Create a factory function or closure that produces instances of your custom keyword
//! 3. Register the custom keyword via [`ValidationOptions::with_keyword`]
//!
//! Here's a complete example:
//!
//! ```rust
//! use schema_engine::{
//!     paths::{JsonPointer, JsonPointerNode},
//!     ErrorIterator, Keyword, ValidationError,
//! };
//! use serde_json::{json, Map, Value};
//! use std::iter::once;
//!
//! // Step 1: Implement the Keyword trait
//! struct EvenNumberValidator;
//!
//! impl Keyword for EvenNumberValidator {
//!     fn validate<'instance>(
//!         &self,
//!         instance: &'instance Value,
//!         instance_path: &JsonPointerNode,
//!     ) -> ErrorIterator<'instance> {
//!         if let Value::Number(n) = instance {
//!             if n.as_u64().map_or(false, |n| n % 2 == 0) {
//!                 Box::new(None.into_iter())
//!             } else {
//!                 let error = ValidationError::custom(
//!                     JsonPointer::default(),
//!                     instance_path.into(),
//!                     instance,
//!                     "Number must be even",
//!                 );
//!                 Box::new(once(error))
//!             }
//!         } else {
//!             let error = ValidationError::custom(
//!                 JsonPointer::default(),
//!                 instance_path.into(),
//!                 instance,
//!                 "Value must be a number",
//!             );
//!             Box::new(once(error))
//!         }
//!     }
//!
//!     fn is_valid(&self, instance: &Value) -> bool {
//!         instance.as_u64().map_or(false, |n| n % 2 == 0)
//!     }
//! }
//!
//! // Step 2: Create a factory function
//! fn even_number_validator_factory<'a>(
//!     _parent: &'a Map<String, Value>,
//!     value: &'a Value,
//!     _path: JsonPointer,
//! ) -> Result<Box<dyn Keyword>, ValidationError<'a>> {
//!     // You can use the `value` parameter to configure your validator if needed
//!     if value.as_bool() == Some(true) {
//!         Ok(Box::new(EvenNumberValidator))
//!     } else {
//!         Err(ValidationError::custom(
//!             JsonPointer::default(),
//!             JsonPointer::default(),
//!             value,
//!             "The 'even-number' keyword must be set to true",
//!         ))
//!     }
//! }
//!
//! // Step 3: Use the custom keyword
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = json!({"even-number": true, "type": "integer"});
//!     let validator = schema_engine::options()
//!         .with_keyword("even-number", even_number_validator_factory)
//!         .build(&schema)
//!         .expect("Invalid schema");
//!
//!     assert!(validator.is_valid(&json!(2)));
//!     assert!(!validator.is_valid(&json!(3)));
//!     assert!(!validator.is_valid(&json!("not a number")));
//!
//!     Ok(())
//! }
//! ```
//!
//! In this example, we've created a custom `even-number` keyword that validates whether a number is even.
//! The `EvenNumberValidator` implements the actual validation logic, while the `even_number_validator_factory`
//! creates instances of the validator and allows for additional configuration based on the keyword's value in the schema.
//!
//! You can also use a closure instead of a factory function for simpler cases:
//!
//! ```rust
//! # use schema_engine::{
//! #     paths::{JsonPointer, JsonPointerNode},
//! #     ErrorIterator, Keyword, ValidationError,
//! # };
//! # use serde_json::{json, Map, Value};
//! #
//! # struct EvenNumberValidator;
//! #
//! # impl Keyword for EvenNumberValidator {
//! #     fn validate<'instance>(
//! #         &self,
//! #         _instance: &'instance Value,
//! #         _instance_path: &JsonPointerNode,
//! #     ) -> ErrorIterator<'instance> {
//! #         Box::new(None.into_iter())
//! #     }
//! #
//! #     fn is_valid(&self, _instance: &Value) -> bool {
//! #         true
//! #     }
//! # }
//! let schema = json!({"even-number": true, "type": "integer"});
//! let validator = schema_engine::options()
//!     .with_keyword("even-number", |_, _, _| {
//!         Ok(Box::new(EvenNumberValidator))
//!     })
//!     .build(&schema)
//!     .expect("Invalid schema");
//! ```
//!
//! # Custom Formats
//!
//! JSON Schema allows for format validation through the `format` keyword. While `schema_engine`
//! provides built-in validators for standard formats, you can also define custom format validators
//! for domain-specific string formats.
//!
//! To implement a custom format validator:
//!
//! 1. Define a function or a closure that takes a `&str` and returns a `bool`.
//! 2. Register the function via [`ValidationOptions::with_format`].
//!
//! ```rust
//! use serde_json::json;
//!
//! // Step 1: Define the custom format validator function
//! fn ends_with_42(s: &str) -> bool {
//!     s.ends_with("42!")
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Step 2: Create a schema using the custom format
//! let schema = json!({
//!     "type": "string",
//!     "format": "ends-with-42"
//! });
//!
//! // Step 3: Build the validator with the custom format
//! let validator = schema_engine::options()
//!     .with_format("ends-with-42", ends_with_42)
//!     .with_format("ends-with-43", |s: &str| s.ends_with("43!"))
//!     .build(&schema)
//!     .expect("Invalid schema");
//!
//! // Step 4: Validate instances
//! assert!(validator.is_valid(&json!("Hello42!")));
//! assert!(!validator.is_valid(&json!("Hello43!")));
//! assert!(!validator.is_valid(&json!(42))); // Not a string
//! #    Ok(())
//! # }
//! ```
//!
//! ### Notes on Custom Format Validators
//!
//! - Custom format validators are only called for string instances.
//! - Format validation can be disabled globally or per-draft using [`ValidationOptions`].
//!   Ensure format validation is enabled if you're using custom formats.
pub mod cancellation;
mod compiler;
mod content_encoding;
mod content_media_type;
mod ecma;
pub mod error;
mod keywords;
mod node;
mod options;
pub mod output;
pub mod paths;
pub mod primitive_type;
mod retriever;
mod validator;

pub use cancellation::CancellationToken;
pub use error::{ErrorIterator, ValidationError};
pub use keywords::custom::Keyword;
pub use options::ValidationOptions;
pub use output::BasicOutput;
pub use referencing::{Draft, Resource, Retrieve, Uri};
pub use retriever::{SchemaResolver, SchemaResolverError};
pub use validator::Validator;

use serde_json::Value;

/// Create a builder for configuring JSON Schema validation options.
///
/// This is the entry point for customizing validation behavior, such as selecting a
/// specific draft, registering custom keywords or formats, and controlling reference
/// resolution.
///
/// ```rust
/// use serde_json::json;
///
/// let schema = json!({"type": "string"});
/// let validator = schema_engine::options()
///     .with_draft(schema_engine::Draft::Draft7)
///     .build(&schema)
///     .expect("Invalid schema");
///
/// assert!(validator.is_valid(&json!("Hello, world!")));
/// ```
#[must_use]
#[inline]
pub fn options() -> ValidationOptions {
    Validator::options()
}

/// Build a [`Validator`] from the input schema, using the default configuration.
///
/// The draft is detected automatically from the `$schema` keyword, falling back to the
/// latest supported draft if it is absent.
///
/// ```rust
/// use serde_json::json;
///
/// let schema = json!({"type": "string"});
/// let validator = schema_engine::validator_for(&schema).expect("Invalid schema");
///
/// assert!(validator.is_valid(&json!("Hello, world!")));
/// assert!(!validator.is_valid(&json!(42)));
/// ```
#[inline]
pub fn validator_for(schema: &Value) -> Result<Validator, ValidationError<'static>> {
    Validator::new(schema)
}

/// A shortcut for validating `instance` against `schema`. Draft version is detected automatically.
/// ```rust
/// use schema_engine::is_valid;
/// use serde_json::json;
///
/// let schema = json!({"maxLength": 5});
/// let instance = json!("foo");
/// assert!(is_valid(&schema, &instance));
/// ```
///
/// This function panics if an invalid schema is passed.
#[must_use]
#[inline]
pub fn is_valid(schema: &Value, instance: &Value) -> bool {
    let validator = validator_for(schema).expect("Invalid schema");
    validator.is_valid(instance)
}

#[cfg(test)]
pub(crate) mod tests_util {
    use crate::{Draft, ValidationError, Validator};
    use serde_json::Value;

    pub(crate) fn is_not_valid_with(validator: &Validator, instance: &Value) {
        assert!(
            !validator.is_valid(instance),
            "{} should not be valid (via is_valid)",
            instance
        );
        assert!(
            validator.validate(instance).is_err(),
            "{} should not be valid (via validate)",
            instance
        );
        assert!(
            !validator.apply(instance).basic().is_valid(),
            "{} should not be valid (via apply)",
            instance
        );
    }

    pub(crate) fn is_not_valid(schema: &Value, instance: &Value) {
        let validator = crate::validator_for(schema).unwrap();
        is_not_valid_with(&validator, instance)
    }

    pub(crate) fn is_not_valid_with_draft(draft: Draft, schema: &Value, instance: &Value) {
        let validator = crate::options()
            .with_draft(draft)
            .build(schema)
            .unwrap();
        is_not_valid_with(&validator, instance)
    }

    pub(crate) fn expect_errors(schema: &Value, instance: &Value, errors: &[&str]) {
        let validator = crate::validator_for(schema).expect("Should be a valid schema");
        assert_eq!(
            validator
                .validate(instance)
                .expect_err(format!("{} should not be valid", instance).as_str())
                .map(|e| e.to_string())
                .collect::<Vec<String>>(),
            errors
        )
    }

    pub(crate) fn is_valid_with(validator: &Validator, instance: &Value) {
        if let Err(mut errors) = validator.validate(instance) {
            let first = errors.next().expect("Errors iterator is empty");
            panic!(
                "{} should be valid (via validate). Error: {} at {}",
                instance, first, first.instance_path
            );
        }
        assert!(
            validator.is_valid(instance),
            "{} should be valid (via is_valid)",
            instance
        );
        assert!(
            validator.apply(instance).basic().is_valid(),
            "{} should be valid (via apply)",
            instance
        );
    }

    pub(crate) fn is_valid(schema: &Value, instance: &Value) {
        let validator = crate::validator_for(schema).unwrap();
        is_valid_with(&validator, instance);
    }

    pub(crate) fn is_valid_with_draft(draft: Draft, schema: &Value, instance: &Value) {
        let validator = crate::options()
            .with_draft(draft)
            .build(schema)
            .unwrap();
        is_valid_with(&validator, instance)
    }

    pub(crate) fn validate(schema: &Value, instance: &Value) -> ValidationError<'static> {
        let validator = crate::validator_for(schema).unwrap();
        validator
            .validate(instance)
            .expect_err("Should be an error")
            .next()
            .expect("Should be an error")
            .into_owned()
    }

    pub(crate) fn validate_with_draft(
        draft: Draft,
        schema: &Value,
        instance: &Value,
    ) -> ValidationError<'static> {
        let validator = crate::options().with_draft(draft).build(schema).unwrap();
        validator
            .validate(instance)
            .expect_err("Should be an error")
            .next()
            .expect("Should be an error")
            .into_owned()
    }

    pub(crate) fn assert_schema_path(schema: &Value, instance: &Value, expected: &str) {
        let error = validate(schema, instance);
        assert_eq!(error.schema_path.to_string(), expected)
    }

    pub(crate) fn assert_schema_path_with_draft(
        draft: Draft,
        schema: &Value,
        instance: &Value,
        expected: &str,
    ) {
        let error = validate_with_draft(draft, schema, instance);
        assert_eq!(error.schema_path.to_string(), expected)
    }

    pub(crate) fn assert_schema_paths(schema: &Value, instance: &Value, expected: &[&str]) {
        let validator = crate::validator_for(schema).unwrap();
        let errors = validator.validate(instance).expect_err("Should be an error");
        for (error, schema_path) in errors.zip(expected) {
            assert_eq!(error.schema_path.to_string(), *schema_path)
        }
    }
}
