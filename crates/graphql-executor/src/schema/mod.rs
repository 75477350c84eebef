//! The schema the executor runs against: object graph, resolver bindings, directives and
//! the translator used for scalar values.
//!
//! Building a schema only checks what the executor relies on (known type references, a
//! query root that is an object). Full type-system validation is left to whoever produces
//! the definitions.

mod resolver;
mod translator;

use std::{collections::HashSet, future::Future, sync::Arc};

use async_graphql_parser::types::{BaseType, Type};
use async_graphql_value::{ConstValue, Name};
use indexmap::IndexMap;

pub use resolver::*;
pub use translator::*;

use crate::{
    directive::{self, DirectiveRegistry, DirectiveSpec},
    error::{InputValueError, ResolverError},
};

pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("The query root type '{0}' is not defined.")]
    MissingQueryType(String),
    #[error("The query root type '{0}' must be an object type.")]
    QueryTypeNotObject(String),
    #[error("Type '{0}' is defined more than once.")]
    DuplicateType(String),
    #[error("Unknown type '{ty}' referenced by {referrer}.")]
    UnknownType { ty: String, referrer: String },
    #[error("Type '{object}' cannot implement '{interface}' which is not an interface.")]
    NotAnInterface { object: String, interface: String },
    #[error("Union '{union}' can only contain object types, found '{member}'.")]
    InvalidUnionMember { union: String, member: String },
    #[error("{referrer} must have an input type, found '{ty}'.")]
    NotAnInputType { ty: String, referrer: String },
    #[error("Type '{object}' implements '{interface}' but does not define its field '{field}'.")]
    MissingInterfaceField {
        object: String,
        interface: String,
        field: String,
    },
    #[error("Invalid default value for {referrer}: {source}")]
    InvalidDefaultValue {
        referrer: String,
        #[source]
        source: InputValueError,
    },
}

pub struct Schema {
    query_type: Name,
    types: IndexMap<Name, MetaType>,
    directives: DirectiveRegistry,
    translator: Arc<dyn TypeTranslator>,
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("query_type", &self.query_type)
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("directives", &self.directives)
            .finish_non_exhaustive()
    }
}

impl Schema {
    pub fn build(query_type: &str) -> SchemaBuilder {
        SchemaBuilder::new(query_type)
    }

    pub fn query_type_name(&self) -> &str {
        &self.query_type
    }

    /// Always present on a built schema.
    pub fn query_type(&self) -> Option<&ObjectType> {
        self.object(&self.query_type)
    }

    pub fn get(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        match self.types.get(name)? {
            MetaType::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The type named by the innermost part of `ty`, e.g. `Character` for `[Character!]!`.
    pub fn named_type(&self, ty: &Type) -> Option<&MetaType> {
        self.get(named_type(ty))
    }

    pub fn directives(&self) -> &DirectiveRegistry {
        &self.directives
    }

    pub fn translator(&self) -> &dyn TypeTranslator {
        self.translator.as_ref()
    }

    /// Whether an object of type `object` is also of type `ty`: the same type, an interface
    /// it implements or a union it belongs to.
    pub fn is_possible_type(&self, ty: &str, object: &str) -> bool {
        self.get(ty)
            .map(|meta| meta.possible_types().any(|name| name.as_str() == object))
            .unwrap_or_default()
    }

    /// Whether some object could be of both types at once.
    pub fn types_overlap(&self, a: &str, b: &str) -> bool {
        let (Some(a), Some(b)) = (self.get(a), self.get(b)) else {
            return false;
        };
        let b_types = b.possible_types().collect::<HashSet<_>>();
        a.possible_types().any(|name| b_types.contains(name))
    }
}

pub(crate) fn named_type(ty: &Type) -> &str {
    match &ty.base {
        BaseType::Named(name) => name,
        BaseType::List(item) => named_type(item),
    }
}

#[derive(Debug)]
pub enum MetaType {
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    Scalar(ScalarType),
}

impl MetaType {
    pub fn name(&self) -> &str {
        match self {
            MetaType::Object(object) => &object.name,
            MetaType::Interface(interface) => &interface.name,
            MetaType::Union(union) => &union.name,
            MetaType::Enum(r#enum) => &r#enum.name,
            MetaType::Scalar(scalar) => &scalar.name,
        }
    }

    /// Scalars and enums, the types without a selection set.
    pub fn is_leaf(&self) -> bool {
        matches!(self, MetaType::Enum(_) | MetaType::Scalar(_))
    }

    /// Types that can be used for arguments and variables.
    pub fn is_input(&self) -> bool {
        self.is_leaf()
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, MetaType::Interface(_) | MetaType::Union(_))
    }

    /// Field definition for selections made directly on this type.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDefinition> {
        match self {
            MetaType::Object(object) => object.field_by_name(name),
            MetaType::Interface(interface) => interface.field_by_name(name),
            _ => None,
        }
    }

    pub fn possible_types(&self) -> Box<dyn Iterator<Item = &Name> + '_> {
        match self {
            MetaType::Object(object) => Box::new(std::iter::once(&object.name)),
            MetaType::Interface(interface) => Box::new(interface.possible_types.iter()),
            MetaType::Union(union) => Box::new(union.members.iter()),
            MetaType::Enum(_) | MetaType::Scalar(_) => Box::new(std::iter::empty()),
        }
    }

    fn field_map(&self) -> Option<&IndexMap<Name, FieldDefinition>> {
        match self {
            MetaType::Object(object) => Some(&object.fields),
            MetaType::Interface(interface) => Some(&interface.fields),
            _ => None,
        }
    }

    fn field_map_mut(&mut self) -> Option<&mut IndexMap<Name, FieldDefinition>> {
        match self {
            MetaType::Object(object) => Some(&mut object.fields),
            MetaType::Interface(interface) => Some(&mut interface.fields),
            _ => None,
        }
    }

    pub(crate) fn type_resolver(&self) -> Option<&TypeResolverFn> {
        match self {
            MetaType::Interface(interface) => interface.type_resolver.as_ref(),
            MetaType::Union(union) => union.type_resolver.as_ref(),
            _ => None,
        }
    }
}

impl From<ObjectType> for MetaType {
    fn from(object: ObjectType) -> Self {
        MetaType::Object(object)
    }
}

impl From<InterfaceType> for MetaType {
    fn from(interface: InterfaceType) -> Self {
        MetaType::Interface(interface)
    }
}

impl From<UnionType> for MetaType {
    fn from(union: UnionType) -> Self {
        MetaType::Union(union)
    }
}

impl From<EnumType> for MetaType {
    fn from(r#enum: EnumType) -> Self {
        MetaType::Enum(r#enum)
    }
}

impl From<ScalarType> for MetaType {
    fn from(scalar: ScalarType) -> Self {
        MetaType::Scalar(scalar)
    }
}

#[derive(Debug)]
pub struct ObjectType {
    name: Name,
    fields: IndexMap<Name, FieldDefinition>,
    implements: Vec<Name>,
}

impl ObjectType {
    pub fn new(name: &str) -> Self {
        ObjectType {
            name: Name::new(name),
            fields: IndexMap::new(),
            implements: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: &str) -> Self {
        self.implements.push(Name::new(interface));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.values()
    }
}

pub struct InterfaceType {
    name: Name,
    fields: IndexMap<Name, FieldDefinition>,
    possible_types: Vec<Name>,
    type_resolver: Option<TypeResolverFn>,
}

impl std::fmt::Debug for InterfaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterfaceType")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("possible_types", &self.possible_types)
            .finish_non_exhaustive()
    }
}

impl InterfaceType {
    pub fn new(name: &str) -> Self {
        InterfaceType {
            name: Name::new(name),
            fields: IndexMap::new(),
            possible_types: Vec::new(),
            type_resolver: None,
        }
    }

    /// Fields selectable through the interface. Resolvers are taken from the concrete
    /// object type, so the one given here is never invoked.
    #[must_use]
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    /// Fallback used when a value of this interface has no `__typename`.
    #[must_use]
    pub fn resolve_type(mut self, f: impl Fn(&ResolvedValue) -> Option<String> + Send + Sync + 'static) -> Self {
        self.type_resolver = Some(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

pub struct UnionType {
    name: Name,
    members: Vec<Name>,
    type_resolver: Option<TypeResolverFn>,
}

impl std::fmt::Debug for UnionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnionType")
            .field("name", &self.name)
            .field("members", &self.members)
            .finish_non_exhaustive()
    }
}

impl UnionType {
    pub fn new(name: &str) -> Self {
        UnionType {
            name: Name::new(name),
            members: Vec::new(),
            type_resolver: None,
        }
    }

    #[must_use]
    pub fn member(mut self, object: &str) -> Self {
        self.members.push(Name::new(object));
        self
    }

    /// Fallback used when a value of this union has no `__typename`.
    #[must_use]
    pub fn resolve_type(mut self, f: impl Fn(&ResolvedValue) -> Option<String> + Send + Sync + 'static) -> Self {
        self.type_resolver = Some(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
pub struct EnumType {
    name: Name,
    values: Vec<Name>,
}

impl EnumType {
    pub fn new(name: &str, values: impl IntoIterator<Item = &'static str>) -> Self {
        EnumType {
            name: Name::new(name),
            values: values.into_iter().map(Name::new).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find_value_by_name(&self, name: &str) -> Option<&Name> {
        self.values.iter().find(|value| value.as_str() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Int,
    Float,
    String,
    Boolean,
    Id,
    /// Values pass through untouched in both directions.
    Custom,
}

#[derive(Debug)]
pub struct ScalarType {
    name: Name,
    kind: ScalarKind,
}

impl ScalarType {
    pub fn custom(name: &str) -> Self {
        ScalarType {
            name: Name::new(name),
            kind: ScalarKind::Custom,
        }
    }

    fn builtin(name: &str) -> Self {
        let kind = match name {
            "Int" => ScalarKind::Int,
            "Float" => ScalarKind::Float,
            "String" => ScalarKind::String,
            "Boolean" => ScalarKind::Boolean,
            "ID" => ScalarKind::Id,
            _ => ScalarKind::Custom,
        };
        ScalarType {
            name: Name::new(name),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }
}

/// A declared argument of a field resolver or a directive.
#[derive(Debug, Clone)]
pub struct InputValueDefinition {
    pub name: Name,
    pub ty: Type,
    pub default_value: Option<ConstValue>,
    pub description: Option<String>,
}

impl InputValueDefinition {
    pub fn new(name: &str, ty: &str) -> Self {
        InputValueDefinition {
            name: Name::new(name),
            ty: parse_type(ty),
            default_value: None,
            description: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<ConstValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A field of an object type together with its resolver descriptor.
#[derive(Debug)]
pub struct FieldDefinition {
    name: Name,
    ty: Type,
    arguments: Vec<InputValueDefinition>,
    resolver: Resolver,
}

impl FieldDefinition {
    pub fn new(name: &str, ty: &str) -> Self {
        FieldDefinition {
            name: Name::new(name),
            ty: parse_type(ty),
            arguments: Vec::new(),
            resolver: Resolver::Parent,
        }
    }

    #[must_use]
    pub fn argument(mut self, argument: InputValueDefinition) -> Self {
        self.arguments.push(argument);
        self
    }

    #[must_use]
    pub fn resolve<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ResolvedValue, ResolverError>> + Send + 'static,
    {
        self.resolver = Resolver::new(f);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn arguments(&self) -> &[InputValueDefinition] {
        &self.arguments
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }
}

/// Malformed type strings become an unknown named type, reported when the schema is built.
fn parse_type(ty: &str) -> Type {
    Type::new(ty).unwrap_or_else(|| Type {
        base: BaseType::Named(Name::new(ty)),
        nullable: true,
    })
}

pub struct SchemaBuilder {
    query_type: Name,
    types: Vec<MetaType>,
    directives: IndexMap<Name, DirectiveSpec>,
    translator: Arc<dyn TypeTranslator>,
}

impl SchemaBuilder {
    fn new(query_type: &str) -> Self {
        SchemaBuilder {
            query_type: Name::new(query_type),
            types: BUILTIN_SCALARS
                .iter()
                .map(|name| MetaType::Scalar(ScalarType::builtin(name)))
                .collect(),
            directives: directive::builtins()
                .into_iter()
                .map(|directive| (Name::new(directive.name()), directive))
                .collect(),
            translator: Arc::new(BuiltinTranslator),
        }
    }

    #[must_use]
    pub fn register(mut self, ty: impl Into<MetaType>) -> Self {
        self.types.push(ty.into());
        self
    }

    /// Adds a directive, replacing any existing one with the same name.
    #[must_use]
    pub fn directive(mut self, directive: DirectiveSpec) -> Self {
        self.directives.insert(Name::new(directive.name()), directive);
        self
    }

    #[must_use]
    pub fn translator(mut self, translator: impl TypeTranslator + 'static) -> Self {
        self.translator = Arc::new(translator);
        self
    }

    pub fn finish(self) -> Result<Schema, SchemaError> {
        let mut types = IndexMap::with_capacity(self.types.len());
        for ty in self.types {
            let name = Name::new(ty.name());
            if types.insert(name.clone(), ty).is_some() {
                return Err(SchemaError::DuplicateType(name.to_string()));
            }
        }

        match types.get(&self.query_type) {
            None => return Err(SchemaError::MissingQueryType(self.query_type.to_string())),
            Some(MetaType::Object(_)) => {}
            Some(_) => return Err(SchemaError::QueryTypeNotObject(self.query_type.to_string())),
        }

        let mut implementations = Vec::new();
        for ty in types.values() {
            match ty {
                MetaType::Object(object) => {
                    for field in object.fields.values() {
                        let referrer = format!("field '{}.{}'", object.name, field.name);
                        check_type_reference(&types, &field.ty, &referrer, false)?;
                        for argument in &field.arguments {
                            let referrer = format!("argument '{}.{}({}:)'", object.name, field.name, argument.name);
                            check_type_reference(&types, &argument.ty, &referrer, true)?;
                        }
                    }
                    for interface in &object.implements {
                        match types.get(interface) {
                            Some(MetaType::Interface(implemented)) => {
                                if let Some(field) = implemented
                                    .fields
                                    .values()
                                    .find(|field| object.field_by_name(&field.name).is_none())
                                {
                                    return Err(SchemaError::MissingInterfaceField {
                                        object: object.name.to_string(),
                                        interface: interface.to_string(),
                                        field: field.name.to_string(),
                                    });
                                }
                                implementations.push((interface.clone(), object.name.clone()));
                            }
                            Some(_) => {
                                return Err(SchemaError::NotAnInterface {
                                    object: object.name.to_string(),
                                    interface: interface.to_string(),
                                })
                            }
                            None => {
                                return Err(SchemaError::UnknownType {
                                    ty: interface.to_string(),
                                    referrer: format!("type '{}'", object.name),
                                })
                            }
                        }
                    }
                }
                MetaType::Union(union) => {
                    for member in &union.members {
                        if !matches!(types.get(member), Some(MetaType::Object(_))) {
                            return Err(SchemaError::InvalidUnionMember {
                                union: union.name.to_string(),
                                member: member.to_string(),
                            });
                        }
                    }
                }
                MetaType::Interface(interface) => {
                    for field in interface.fields.values() {
                        let referrer = format!("field '{}.{}'", interface.name, field.name);
                        check_type_reference(&types, &field.ty, &referrer, false)?;
                        for argument in &field.arguments {
                            let referrer = format!("argument '{}.{}({}:)'", interface.name, field.name, argument.name);
                            check_type_reference(&types, &argument.ty, &referrer, true)?;
                        }
                    }
                }
                MetaType::Enum(_) | MetaType::Scalar(_) => {}
            }
        }

        for (interface, object) in implementations {
            if let Some(MetaType::Interface(interface)) = types.get_mut(&interface) {
                interface.possible_types.push(object);
            }
        }

        for directive in self.directives.values() {
            for argument in directive.arguments() {
                let referrer = format!("argument '@{}({}:)'", directive.name(), argument.name);
                check_type_reference(&types, &argument.ty, &referrer, true)?;
            }
        }

        let mut schema = Schema {
            query_type: self.query_type,
            types,
            directives: DirectiveRegistry::default(),
            translator: self.translator,
        };

        // Defaults are coerced once here, resolvers receive them as if they had been supplied.
        let mut defaults = Vec::new();
        for (type_index, ty) in schema.types.values().enumerate() {
            for (field_index, field) in ty.field_map().into_iter().flat_map(IndexMap::values).enumerate() {
                for (argument_index, argument) in field.arguments.iter().enumerate() {
                    let Some(default) = &argument.default_value else {
                        continue;
                    };
                    let referrer = format!("argument '{}.{}({}:)'", ty.name(), field.name, argument.name);
                    let value = coerce_default(&schema, argument, default.clone(), referrer)?;
                    defaults.push((type_index, field_index, argument_index, value));
                }
            }
        }
        for (type_index, field_index, argument_index, value) in defaults {
            let argument = schema
                .types
                .get_index_mut(type_index)
                .and_then(|(_, ty)| ty.field_map_mut())
                .and_then(|fields| fields.get_index_mut(field_index))
                .and_then(|(_, field)| field.arguments.get_mut(argument_index));
            if let Some(argument) = argument {
                argument.default_value = Some(value);
            }
        }

        for mut directive in self.directives.into_values() {
            let name = directive.name().to_string();
            for argument in directive.arguments_mut() {
                let Some(default) = argument.default_value.take() else {
                    continue;
                };
                let referrer = format!("argument '@{name}({}:)'", argument.name);
                let default = coerce_default(&schema, argument, default, referrer)?;
                argument.default_value = Some(default);
            }
            schema.directives.register(directive);
        }

        Ok(schema)
    }
}

fn coerce_default(
    schema: &Schema,
    argument: &InputValueDefinition,
    default: ConstValue,
    referrer: String,
) -> Result<ConstValue, SchemaError> {
    schema
        .translator()
        .coerce_input(schema, &argument.ty, default)
        .map_err(|source| SchemaError::InvalidDefaultValue { referrer, source })
}

fn check_type_reference(
    types: &IndexMap<Name, MetaType>,
    ty: &Type,
    referrer: &str,
    input: bool,
) -> Result<(), SchemaError> {
    let name = named_type(ty);
    match types.get(name) {
        None => Err(SchemaError::UnknownType {
            ty: name.to_string(),
            referrer: referrer.to_string(),
        }),
        Some(meta) if input && !meta.is_input() => Err(SchemaError::NotAnInputType {
            ty: ty.to_string(),
            referrer: referrer.to_string(),
        }),
        Some(_) => Ok(()),
    }
}
