//! Entity registry
//!
//! A [`Schema`] lists the fields of a row-backed type once; the pipeline
//! looks fields up by name in the schema and reads/writes them through the
//! object-safe [`Record`] trait.

use crate::error::TabellaResult;
use crate::model::keys::RowIdentity;
use crate::value::{Value, ValueKind};
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Marks a field as part of the composite key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPart {
    /// Human readable label listed in `key_header_names`
    pub header: Cow<'static, str>,
    pub exclude_from_lookup: bool,
}

/// One field of a row-backed type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: Cow<'static, str>,
    pub kind: ValueKind,
    pub required: bool,
    pub key_part: Option<KeyPart>,
    /// Lookup key fields this field contributes to (see [`Record::set_lookup_key`])
    pub lookup_targets: Vec<Cow<'static, str>>,
}

impl FieldSpec {
    pub fn new(name: impl Into<Cow<'static, str>>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            key_part: None,
            lookup_targets: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn key_part(mut self, header: impl Into<Cow<'static, str>>) -> Self {
        self.key_part = Some(KeyPart {
            header: header.into(),
            exclude_from_lookup: false,
        });
        self
    }

    /// Key part that is left out of the lookup key
    pub fn key_part_excluded_from_lookup(mut self, header: impl Into<Cow<'static, str>>) -> Self {
        self.key_part = Some(KeyPart {
            header: header.into(),
            exclude_from_lookup: true,
        });
        self
    }

    pub fn lookup_part(mut self, target: impl Into<Cow<'static, str>>) -> Self {
        self.lookup_targets.push(target.into());
        self
    }
}

/// Ordered field list of one entity type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Case-insensitive field lookup
    pub fn find(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
    }

    pub fn key_fields(&self) -> impl Iterator<Item = (&FieldSpec, &KeyPart)> {
        self.fields
            .iter()
            .filter_map(|field| field.key_part.as_ref().map(|part| (field, part)))
    }
}

/// Upcast helper so `dyn Record` can be downcast to its concrete type
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A row-backed object
///
/// Field names passed to `get`/`set` are the names declared in the type's
/// [`Schema`].
pub trait Record: AsAny + Send + Sync + fmt::Debug {
    /// Current value of a field; `Value::Null` for unknown fields
    fn get(&self, field: &str) -> Value;

    /// Assign a field; the value already matches the declared kind
    fn set(&mut self, field: &str, value: Value) -> TabellaResult<()>;

    fn identity(&self) -> &RowIdentity;

    fn identity_mut(&mut self) -> &mut RowIdentity;

    /// Receives derived lookup keys for fields declared with
    /// [`FieldSpec::lookup_part`]. Types without such fields ignore it.
    fn set_lookup_key(&mut self, _target: &str, _key: Option<u128>) {}
}

impl dyn Record {
    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        AsAny::as_any(self).downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Record>(&mut self) -> Option<&mut T> {
        AsAny::as_any_mut(self).downcast_mut::<T>()
    }
}

/// A statically known row type
pub trait Model: Record + Default {
    const ENTITY: &'static str;

    fn schema() -> Schema;
}

type Factory = Arc<dyn Fn() -> Box<dyn Record> + Send + Sync>;

/// Entity descriptor: name, schema and constructor, built once per mapping
#[derive(Clone)]
pub struct EntityType {
    name: String,
    schema: Arc<Schema>,
    factory: Factory,
}

impl EntityType {
    pub fn of<T: Model>() -> Self {
        Self {
            name: T::ENTITY.to_string(),
            schema: Arc::new(T::schema()),
            factory: Arc::new(|| Box::new(T::default())),
        }
    }

    pub fn new(
        name: impl Into<String>,
        schema: Schema,
        factory: impl Fn() -> Box<dyn Record> + Send + Sync + 'static,
    ) -> Self {
        Self::from_shared(name, Arc::new(schema), factory)
    }

    /// Descriptor over a schema the factory already holds
    pub fn from_shared(
        name: impl Into<String>,
        schema: Arc<Schema>,
        factory: impl Fn() -> Box<dyn Record> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            schema,
            factory: Arc::new(factory),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn shared_schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    pub fn instantiate(&self) -> Box<dyn Record> {
        (self.factory)()
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityType")
            .field("name", &self.name)
            .field("fields", &self.schema.fields().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TabellaError;

    #[derive(Debug, Default)]
    struct Tag {
        label: Option<String>,
        identity: RowIdentity,
    }

    impl Record for Tag {
        fn get(&self, field: &str) -> Value {
            match field {
                "label" => self.label.clone().into(),
                _ => Value::Null,
            }
        }

        fn set(&mut self, field: &str, value: Value) -> TabellaResult<()> {
            match (field, value) {
                ("label", Value::Text(s)) => self.label = Some(s),
                ("label", Value::Null) => self.label = None,
                (field, _) => return Err(TabellaError::field(field, "unsupported")),
            }
            Ok(())
        }

        fn identity(&self) -> &RowIdentity {
            &self.identity
        }

        fn identity_mut(&mut self) -> &mut RowIdentity {
            &mut self.identity
        }
    }

    impl Model for Tag {
        const ENTITY: &'static str = "Tag";

        fn schema() -> Schema {
            Schema::new(vec![FieldSpec::new("label", ValueKind::Text).required()])
        }
    }

    #[test]
    fn test_schema_find_is_case_insensitive() {
        let schema = Tag::schema();
        assert!(schema.find("LABEL").is_some());
        assert!(schema.find("missing").is_none());
    }

    #[test]
    fn test_entity_type_instantiates_and_downcasts() {
        let entity = EntityType::of::<Tag>();
        assert_eq!(entity.name(), "Tag");

        let mut record = entity.instantiate();
        record.set("label", Value::from("x")).unwrap();
        let tag = record.downcast_ref::<Tag>().unwrap();
        assert_eq!(tag.label.as_deref(), Some("x"));
    }
}
