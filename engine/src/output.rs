//! Implementation of json schema output formats specified in <https://json-schema.org/draft/2020-12/json-schema-core.html#rfc.section.12.2>
//!
//! All four standard formats are supported: [`Output::flag`], [`Output::basic`],
//! [`Output::detailed`] and [`Output::verbose`].

use std::{
    borrow::Cow,
    collections::VecDeque,
    fmt,
    iter::{FromIterator, Sum},
    ops::AddAssign,
};

use crate::{validator::PartialApplication, ValidationError};
use ahash::AHashMap;
use referencing::Uri;
use serde::ser::SerializeMap;

use crate::{
    node::SchemaNode,
    paths::{JsonPointer, JsonPointerNode},
    Validator,
};

/// The output format resulting from the application of a schema. This can be
/// converted into various representations based on the definitions in
/// <https://json-schema.org/draft/2020-12/json-schema-core.html#rfc.section.12.2>
#[derive(Debug, Clone)]
pub struct Output<'a, 'b> {
    schema: &'a Validator,
    root_node: &'a SchemaNode,
    instance: &'b serde_json::Value,
}

impl<'a, 'b> Output<'a, 'b> {
    pub(crate) const fn new<'c, 'd>(
        schema: &'c Validator,
        root_node: &'c SchemaNode,
        instance: &'d serde_json::Value,
    ) -> Output<'c, 'd> {
        Output {
            schema,
            root_node,
            instance,
        }
    }

    /// Indicates whether the schema was valid, corresponds to the "flag" output
    /// format
    #[must_use]
    pub fn flag(&self) -> bool {
        self.schema.is_valid(self.instance)
    }

    /// Output a list of errors and annotations for each element in the schema
    /// according to the basic output format. [`BasicOutput`] implements
    /// `serde::Serialize` in a manner which conforms to the json core spec so
    /// one way to use this is to serialize the `BasicOutput` and examine the
    /// JSON which is produced. However, for rust programs this is not
    /// necessary. Instead you can match on the `BasicOutput` and examine the
    /// results. To use this API you'll need to understand a few things:
    ///
    /// Regardless of whether the the schema validation was successful or not
    /// the `BasicOutput` is a sequence of [`OutputUnit`]s. An `OutputUnit` is
    /// some metadata about where the output is coming from (where in the schema
    /// and where in the instance). The difference between the
    /// `BasicOutput::Valid` and `BasicOutput::Invalid` cases is the value which
    /// is associated with each `OutputUnit`. For `Valid` outputs the value is
    /// an annotation, whilst for `Invalid` outputs it's an [`ErrorDescription`]
    /// (a `String` really).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use schema_engine::BasicOutput;
    /// # use serde_json::json;
    /// # let schema = json!({
    /// #     "title": "string value",
    /// #     "type": "string"
    /// # });
    /// # let instance = json!("some string");
    /// # let validator = schema_engine::validator_for(&schema).expect("Invalid schema");
    /// let output = validator.apply(&instance).basic();
    /// match output {
    ///     BasicOutput::Valid(annotations) => {
    ///         for annotation in annotations {
    ///             println!(
    ///                 "Value: {} at path {}",
    ///                 annotation.value(),
    ///                 annotation.instance_location()
    ///             )
    ///         }
    ///     },
    ///     BasicOutput::Invalid(errors) => {
    ///         for error in errors {
    ///             println!(
    ///                 "Error: {} at path {}",
    ///                 error.error_description(),
    ///                 error.instance_location()
    ///             )
    ///         }
    ///     }
    /// }
    /// ```
    #[must_use]
    pub fn basic(&self) -> BasicOutput<'a> {
        self.root_node
            .apply_rooted(self.instance, &JsonPointerNode::new())
    }

    /// The "detailed" output format: a hierarchical tree of [`DetailedOutput`]
    /// units, grouped by nesting of their keyword location.
    ///
    /// The units themselves are the same ones produced by [`Output::basic`] -
    /// this format only changes how they are arranged relative to one
    /// another, replacing the flat list with the tree structure implied by
    /// their keyword locations. Scopes that contribute no information (a
    /// passing keyword with no annotation) are skipped, same as `basic`.
    #[must_use]
    pub fn detailed(&self) -> DetailedOutput<'a> {
        DetailedOutput::from_basic(self.basic())
    }

    /// The "verbose" output format: the full tree, every applied scope
    /// reported.
    ///
    /// Unlike [`Output::detailed`], a passing keyword that produced no
    /// annotation still gets a node in the tree - its [`DetailedUnit::value`]
    /// is `None`. This is built from its own unpruned walk of the evaluation
    /// rather than derived from [`Output::basic`]'s already-pruned flat list,
    /// since that list has discarded exactly the scopes this format needs to
    /// report.
    #[must_use]
    pub fn verbose(&self) -> DetailedOutput<'a> {
        let basic = self
            .root_node
            .apply_rooted_verbose(self.instance, &JsonPointerNode::new());
        DetailedOutput::from_basic(basic)
    }
}

/// The "basic" output format. See the documentation for [`Output::basic`] for
/// examples of how to use this.
#[derive(Debug, PartialEq)]
pub enum BasicOutput<'a> {
    /// The schema was valid, collected annotations can be examined
    Valid(VecDeque<OutputUnit<Annotations<'a>>>),
    /// The schema was invalid
    Invalid(VecDeque<OutputUnit<ErrorDescription>>),
}

impl<'a> BasicOutput<'a> {
    /// A shortcut to check whether the output represents passed validation.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        match self {
            BasicOutput::Valid(..) => true,
            BasicOutput::Invalid(..) => false,
        }
    }
}

impl<'a> From<OutputUnit<Annotations<'a>>> for BasicOutput<'a> {
    fn from(unit: OutputUnit<Annotations<'a>>) -> Self {
        let mut units = VecDeque::new();
        units.push_front(unit);
        BasicOutput::Valid(units)
    }
}

impl<'a> AddAssign for BasicOutput<'a> {
    fn add_assign(&mut self, rhs: Self) {
        match (&mut *self, rhs) {
            (BasicOutput::Valid(ref mut anns), BasicOutput::Valid(anns_rhs)) => {
                anns.extend(anns_rhs);
            }
            (BasicOutput::Valid(..), BasicOutput::Invalid(errors)) => {
                *self = BasicOutput::Invalid(errors)
            }
            (BasicOutput::Invalid(..), BasicOutput::Valid(..)) => {}
            (BasicOutput::Invalid(errors), BasicOutput::Invalid(errors_rhs)) => {
                errors.extend(errors_rhs)
            }
        }
    }
}

impl<'a> Sum for BasicOutput<'a> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let result = BasicOutput::Valid(VecDeque::new());
        iter.fold(result, |mut acc, elem| {
            acc += elem;
            acc
        })
    }
}

impl<'a> Default for BasicOutput<'a> {
    fn default() -> Self {
        BasicOutput::Valid(VecDeque::new())
    }
}

/// The "detailed"/"verbose" output format: the units produced by
/// [`Output::basic`], arranged as a tree by nesting of their keyword
/// location rather than a flat list. See [`Output::detailed`].
#[derive(Debug, PartialEq)]
pub enum DetailedOutput<'a> {
    /// The schema was valid.
    Valid(DetailedUnit<Annotations<'a>>),
    /// The schema was invalid.
    Invalid(DetailedUnit<ErrorDescription>),
}

/// A node in the [`DetailedOutput`] tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailedUnit<T> {
    keyword_location: JsonPointer,
    instance_location: JsonPointer,
    absolute_keyword_location: Option<Uri<String>>,
    value: Option<T>,
    children: Vec<DetailedUnit<T>>,
}

impl<T> DetailedUnit<T> {
    ///  The location in the schema of the keyword
    pub const fn keyword_location(&self) -> &JsonPointer {
        &self.keyword_location
    }
    ///  The location in the instance
    pub const fn instance_location(&self) -> &JsonPointer {
        &self.instance_location
    }
    /// The absolute location in the schema of the keyword.
    pub fn absolute_keyword_location(&self) -> Option<Uri<&str>> {
        self.absolute_keyword_location
            .as_ref()
            .map(|uri| uri.borrow())
    }
    /// The annotation or error carried directly by this node, if any.
    pub const fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }
    /// The nested output units produced by subschemas of this keyword.
    pub fn children(&self) -> &[DetailedUnit<T>] {
        &self.children
    }

    fn root(keyword_location: JsonPointer, instance_location: JsonPointer) -> Self {
        DetailedUnit {
            keyword_location,
            instance_location,
            absolute_keyword_location: None,
            value: None,
            children: Vec::new(),
        }
    }

    /// Descend into (creating if necessary) the child whose `keyword_location`
    /// is `self.keyword_location` extended by one more chunk than `self`'s.
    /// Used to rebuild a tree from a flat, preorder list of units each of
    /// which carries its own full keyword location.
    fn insert(&mut self, unit: OutputUnit<T>)
    where
        T: MaybeEmpty,
    {
        let (keyword_location, instance_location, absolute_keyword_location, value) =
            unit.into_parts();
        self.insert_at(keyword_location, instance_location, absolute_keyword_location, value);
    }

    /// Find-or-create the child that `(keyword_location, instance_location)` belongs under.
    /// Two units can share a full `keyword_location` while differing in `instance_location` -
    /// for example a `{"items": {"type": "integer"}}` schema failing on more than one array
    /// element reports every failure at keyword location `/items/type`, one per instance
    /// location `/0`, `/1`, etc. Such units must stay distinct sibling nodes, so matching below
    /// only treats a node as a true duplicate once both coordinates agree; short of the full
    /// keyword location, nodes are shared scaffolding and match on the keyword location alone.
    fn insert_at(
        &mut self,
        keyword_location: JsonPointer,
        instance_location: JsonPointer,
        absolute_keyword_location: Option<Uri<String>>,
        value: T,
    ) where
        T: MaybeEmpty,
    {
        if keyword_location == self.keyword_location && instance_location == self.instance_location
        {
            self.value = if value.is_empty_marker() { None } else { Some(value) };
            self.absolute_keyword_location = absolute_keyword_location;
            return;
        }
        let next_depth = self.keyword_location.iter().count() + 1;
        let prefix: Vec<_> = keyword_location
            .iter()
            .take(next_depth)
            .cloned()
            .collect();
        let is_final_depth = prefix.len() == keyword_location.iter().count();
        let prefix = JsonPointer::from_chunks(prefix);
        if let Some(child) = self.children.iter_mut().find(|child| {
            child.keyword_location == prefix
                && (!is_final_depth || child.instance_location == instance_location)
        }) {
            child.insert_at(keyword_location, instance_location, absolute_keyword_location, value);
        } else {
            // A scaffold node (one short of the full keyword location) doesn't correspond to a
            // single `OutputUnit` - it's shared by every instance location its descendants carry
            // (e.g. `/items` is the parent of both `/items/type` @ `/0` and @ `/1`), so it can't
            // adopt whichever instance location happens to arrive first. A keyword is always
            // evaluated at the same instance location as its own parent schema - only its
            // children descend into deeper instance locations - so the scaffold inherits `self`'s
            // instance location. If a real unit for this exact keyword location later arrives (as
            // `/items`'s own pass/fail annotation does), the match arm above overwrites it.
            let scaffold_location = if is_final_depth {
                instance_location.clone()
            } else {
                self.instance_location.clone()
            };
            let mut child = DetailedUnit::root(prefix, scaffold_location);
            child.insert_at(keyword_location, instance_location, absolute_keyword_location, value);
            self.children.push(child);
        }
    }
}

/// Distinguishes a real annotation/error from [`Annotations::empty`]'s "visited, nothing to
/// report" marker, so the verbose tree can store the latter as `value: None` instead of a
/// spurious `Some`.
trait MaybeEmpty {
    fn is_empty_marker(&self) -> bool {
        false
    }
}

impl MaybeEmpty for ErrorDescription {}

impl<'a> MaybeEmpty for Annotations<'a> {
    fn is_empty_marker(&self) -> bool {
        matches!(self.0, AnnotationsInner::Empty)
    }
}

impl<'a> DetailedOutput<'a> {
    fn from_basic(basic: BasicOutput<'a>) -> Self {
        match basic {
            BasicOutput::Valid(units) => {
                let mut root = DetailedUnit::root(JsonPointer::default(), JsonPointer::default());
                for unit in units {
                    root.insert(unit);
                }
                DetailedOutput::Valid(root)
            }
            BasicOutput::Invalid(units) => {
                let mut root = DetailedUnit::root(JsonPointer::default(), JsonPointer::default());
                for unit in units {
                    root.insert(unit);
                }
                DetailedOutput::Invalid(root)
            }
        }
    }

    /// A shortcut to check whether the output represents passed validation.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, DetailedOutput::Valid(..))
    }
}

impl<T: serde::Serialize> serde::Serialize for DetailedUnit<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map_ser = serializer.serialize_map(None)?;
        map_ser.serialize_entry("keywordLocation", &self.keyword_location)?;
        map_ser.serialize_entry("instanceLocation", &self.instance_location)?;
        if let Some(absolute) = &self.absolute_keyword_location {
            map_ser.serialize_entry("absoluteKeywordLocation", &absolute)?;
        }
        if let Some(value) = &self.value {
            map_ser.serialize_entry("value", value)?;
        }
        if !self.children.is_empty() {
            map_ser.serialize_entry("children", &self.children)?;
        }
        map_ser.end()
    }
}

impl<'a> serde::Serialize for DetailedOutput<'a> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map_ser = serializer.serialize_map(Some(2))?;
        match self {
            DetailedOutput::Valid(root) => {
                map_ser.serialize_entry("valid", &true)?;
                map_ser.serialize_entry("annotations", root)?;
            }
            DetailedOutput::Invalid(root) => {
                map_ser.serialize_entry("valid", &false)?;
                map_ser.serialize_entry("errors", root)?;
            }
        }
        map_ser.end()
    }
}

impl<'a> From<BasicOutput<'a>> for PartialApplication<'a> {
    fn from(output: BasicOutput<'a>) -> Self {
        match output {
            BasicOutput::Valid(anns) => PartialApplication::Valid {
                annotations: None,
                child_results: anns,
            },
            BasicOutput::Invalid(errors) => PartialApplication::Invalid {
                errors: Vec::new(),
                child_results: errors,
            },
        }
    }
}

impl<'a> FromIterator<BasicOutput<'a>> for PartialApplication<'a> {
    fn from_iter<T: IntoIterator<Item = BasicOutput<'a>>>(iter: T) -> Self {
        iter.into_iter().sum::<BasicOutput<'_>>().into()
    }
}

/// An output unit is a reference to a place in a schema and a place in an
/// instance along with some value associated to that place. For annotations the
/// value will be an [`Annotations`] and for errors it will be an
/// [`ErrorDescription`]. See the documentation for [`Output::basic`] for a
/// detailed example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUnit<T> {
    keyword_location: JsonPointer,
    instance_location: JsonPointer,
    absolute_keyword_location: Option<Uri<String>>,
    value: T,
}

impl<T> OutputUnit<T> {
    pub(crate) const fn annotations(
        keyword_location: JsonPointer,
        instance_location: JsonPointer,
        absolute_keyword_location: Option<Uri<String>>,
        annotations: Annotations<'_>,
    ) -> OutputUnit<Annotations<'_>> {
        OutputUnit {
            keyword_location,
            instance_location,
            absolute_keyword_location,
            value: annotations,
        }
    }

    pub(crate) const fn error(
        keyword_location: JsonPointer,
        instance_location: JsonPointer,
        absolute_keyword_location: Option<Uri<String>>,
        error: ErrorDescription,
    ) -> OutputUnit<ErrorDescription> {
        OutputUnit {
            keyword_location,
            instance_location,
            absolute_keyword_location,
            value: error,
        }
    }

    ///  The location in the schema of the keyword
    pub const fn keyword_location(&self) -> &JsonPointer {
        &self.keyword_location
    }

    /// The absolute location in the schema of the keyword. This will be
    /// different to `keyword_location` if the schema is a resolved reference.
    pub fn absolute_keyword_location(&self) -> Option<Uri<&str>> {
        self.absolute_keyword_location
            .as_ref()
            .map(|uri| uri.borrow())
    }

    ///  The location in the instance
    pub const fn instance_location(&self) -> &JsonPointer {
        &self.instance_location
    }

    fn into_parts(self) -> (JsonPointer, JsonPointer, Option<Uri<String>>, T) {
        (
            self.keyword_location,
            self.instance_location,
            self.absolute_keyword_location,
            self.value,
        )
    }
}

impl OutputUnit<Annotations<'_>> {
    /// The annotations found at this output unit
    #[must_use]
    pub fn value(&self) -> Cow<'_, serde_json::Value> {
        self.value.value()
    }
}

impl OutputUnit<ErrorDescription> {
    /// The error for this output unit
    #[must_use]
    pub const fn error_description(&self) -> &ErrorDescription {
        &self.value
    }
}

/// Annotations associated with an output unit.
#[derive(serde::Serialize, Debug, Clone, PartialEq)]
pub struct Annotations<'a>(AnnotationsInner<'a>);

impl<'a> Annotations<'a> {
    /// Marks a scope that was visited during verbose evaluation but produced no annotation of its
    /// own (e.g. a `type` keyword that simply passed). Only ever constructed by the verbose output
    /// walk; `basic`/`detailed` never see it because they don't ask for these scopes in the first
    /// place.
    pub(crate) const fn empty() -> Self {
        Annotations(AnnotationsInner::Empty)
    }

    /// The `serde_json::Value` of the annotation
    #[must_use]
    pub fn value(&'a self) -> Cow<'a, serde_json::Value> {
        match &self.0 {
            AnnotationsInner::Value(v) => Cow::Borrowed(v),
            AnnotationsInner::ValueRef(v) => Cow::Borrowed(v),
            AnnotationsInner::UnmatchedKeywords(kvs) => {
                let value = serde_json::to_value(kvs)
                    .expect("&AHashMap<String, serde_json::Value> cannot fail serializing");
                Cow::Owned(value)
            }
            AnnotationsInner::Empty => Cow::Owned(serde_json::Value::Null),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum AnnotationsInner<'a> {
    UnmatchedKeywords(&'a AHashMap<String, serde_json::Value>),
    ValueRef(&'a serde_json::Value),
    Value(Box<serde_json::Value>),
    /// A scope visited under verbose evaluation with nothing to annotate.
    Empty,
}

impl<'a> From<&'a AHashMap<String, serde_json::Value>> for Annotations<'a> {
    fn from(anns: &'a AHashMap<String, serde_json::Value>) -> Self {
        Annotations(AnnotationsInner::UnmatchedKeywords(anns))
    }
}

impl<'a> From<&'a serde_json::Value> for Annotations<'a> {
    fn from(v: &'a serde_json::Value) -> Self {
        Annotations(AnnotationsInner::ValueRef(v))
    }
}

impl<'a> From<serde_json::Value> for Annotations<'a> {
    fn from(v: serde_json::Value) -> Self {
        Annotations(AnnotationsInner::Value(Box::new(v)))
    }
}

/// An error associated with an [`OutputUnit`]
#[derive(serde::Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescription(String);

impl ErrorDescription {
    /// Returns the inner [`String`] of the error description.
    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ErrorDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ValidationError<'_>> for ErrorDescription {
    fn from(e: ValidationError<'_>) -> Self {
        ErrorDescription(e.to_string())
    }
}

impl<'a> From<&'a str> for ErrorDescription {
    fn from(s: &'a str) -> Self {
        ErrorDescription(s.to_string())
    }
}

impl<'a> serde::Serialize for BasicOutput<'a> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map_ser = serializer.serialize_map(Some(2))?;
        match self {
            BasicOutput::Valid(outputs) => {
                map_ser.serialize_entry("valid", &true)?;
                map_ser.serialize_entry("annotations", outputs)?;
            }
            BasicOutput::Invalid(errors) => {
                map_ser.serialize_entry("valid", &false)?;
                map_ser.serialize_entry("errors", errors)?;
            }
        }
        map_ser.end()
    }
}

impl<'a> serde::Serialize for AnnotationsInner<'a> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::UnmatchedKeywords(kvs) => kvs.serialize(serializer),
            Self::Value(v) => v.serialize(serializer),
            Self::ValueRef(v) => v.serialize(serializer),
            Self::Empty => serializer.serialize_none(),
        }
    }
}

impl<'a> serde::Serialize for OutputUnit<Annotations<'a>> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map_ser = serializer.serialize_map(Some(4))?;
        map_ser.serialize_entry("keywordLocation", &self.keyword_location)?;
        map_ser.serialize_entry("instanceLocation", &self.instance_location)?;
        if let Some(absolute) = &self.absolute_keyword_location {
            map_ser.serialize_entry("absoluteKeywordLocation", &absolute)?;
        }
        map_ser.serialize_entry("annotations", &self.value)?;
        map_ser.end()
    }
}

impl serde::Serialize for OutputUnit<ErrorDescription> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map_ser = serializer.serialize_map(Some(4))?;
        map_ser.serialize_entry("keywordLocation", &self.keyword_location)?;
        map_ser.serialize_entry("instanceLocation", &self.instance_location)?;
        if let Some(absolute) = &self.absolute_keyword_location {
            map_ser.serialize_entry("absoluteKeywordLocation", &absolute)?;
        }
        map_ser.serialize_entry("error", &self.value)?;
        map_ser.end()
    }
}

#[cfg(test)]
mod tests {
    use super::{DetailedOutput, DetailedUnit};
    use serde_json::json;

    #[test]
    fn detailed_valid_schema_has_no_errors() {
        let schema = json!({
            "properties": {
                "foo": {"title": "Foo", "type": "string"}
            }
        });
        let instance = json!({"foo": "bar"});
        let validator = crate::validator_for(&schema).expect("Invalid schema");
        let output = validator.apply(&instance).detailed();
        assert!(output.is_valid());
    }

    #[test]
    fn detailed_invalid_schema_nests_by_keyword_location() {
        let schema = json!({
            "properties": {
                "foo": {"type": "string"}
            }
        });
        let instance = json!({"foo": 1});
        let validator = crate::validator_for(&schema).expect("Invalid schema");
        let output = validator.apply(&instance).detailed();
        assert!(!output.is_valid());
        let serialized = serde_json::to_value(&output).expect("Should serialize");
        assert_eq!(serialized["valid"], json!(false));
    }

    fn collect_locations<T>(unit: &DetailedUnit<T>, out: &mut Vec<(String, String)>) {
        if unit.value().is_some() {
            out.push((
                unit.keyword_location().to_string(),
                unit.instance_location().to_string(),
            ));
        }
        for child in unit.children() {
            collect_locations(child, out);
        }
    }

    #[test]
    fn verbose_reports_scopes_detailed_omits() {
        let schema = json!({
            "properties": {
                "foo": {"type": "string"}
            }
        });
        let instance = json!({"foo": "bar"});
        let validator = crate::validator_for(&schema).expect("Invalid schema");
        let output = validator.apply(&instance);

        let detailed_root = match output.detailed() {
            DetailedOutput::Valid(root) => root,
            DetailedOutput::Invalid(_) => panic!("expected a valid detailed output"),
        };
        let mut detailed_locations = Vec::new();
        collect_locations(&detailed_root, &mut detailed_locations);
        assert!(
            !detailed_locations
                .iter()
                .any(|(keyword, _)| keyword == "/properties/foo/type"),
            "a passing `type` keyword carries no annotation, so detailed() must omit its scope: \
             {detailed_locations:?}"
        );

        let verbose_root = match output.verbose() {
            DetailedOutput::Valid(root) => root,
            DetailedOutput::Invalid(_) => panic!("expected a valid verbose output"),
        };
        let type_scope = verbose_root
            .children()
            .iter()
            .find(|child| child.keyword_location().to_string() == "/properties")
            .and_then(|properties| {
                properties
                    .children()
                    .iter()
                    .find(|child| child.keyword_location().to_string() == "/properties/foo")
            })
            .and_then(|foo| {
                foo.children().iter().find(|child| {
                    child.keyword_location().to_string() == "/properties/foo/type"
                })
            })
            .expect("verbose() must report the passing `type` scope even without an annotation");
        assert!(
            type_scope.value().is_none(),
            "a scope visited with nothing to annotate reports value() == None"
        );
    }

    #[test]
    fn detailed_keeps_distinct_instance_locations_under_the_same_keyword_location() {
        let schema = json!({"items": {"type": "integer"}});
        let instance = json!(["a", "b"]);
        let validator = crate::validator_for(&schema).expect("Invalid schema");
        let output = validator.apply(&instance).detailed();
        assert!(!output.is_valid());

        let root = match output {
            DetailedOutput::Invalid(root) => root,
            DetailedOutput::Valid(_) => panic!("expected an invalid detailed output"),
        };
        let mut locations = Vec::new();
        collect_locations(&root, &mut locations);
        assert!(
            locations.contains(&("/items/type".to_string(), "/0".to_string())),
            "missing the failure for index 0: {locations:?}"
        );
        assert!(
            locations.contains(&("/items/type".to_string(), "/1".to_string())),
            "missing the failure for index 1 - it must not be overwritten by index 0's: {locations:?}"
        );
    }

    #[test]
    fn scaffold_node_instance_location_is_not_borrowed_from_a_child() {
        let schema = json!({"items": {"type": "integer"}});
        let instance = json!(["a", "b"]);
        let validator = crate::validator_for(&schema).expect("Invalid schema");
        let output = validator.apply(&instance).detailed();

        let root = match output {
            DetailedOutput::Invalid(root) => root,
            DetailedOutput::Valid(_) => panic!("expected an invalid detailed output"),
        };
        let items_node = root
            .children()
            .iter()
            .find(|child| child.keyword_location().to_string() == "/items")
            .expect("missing the /items scaffold node");
        assert_eq!(
            items_node.instance_location().to_string(),
            "",
            "the /items scaffold has no unit of its own and must not adopt index 0's \
             instance location just because it was inserted first"
        );
    }
}
