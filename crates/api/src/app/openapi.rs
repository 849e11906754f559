//! OpenAPI document generated from route metadata and input schemas.
//!
//! Every documented route contributes one operation. Its non-body fields
//! become parameters; its body fields become the JSON request body, following
//! the same bare/embedded rule the validator applies.

use std::collections::BTreeMap;

use utoipa::openapi::{
    Deprecated, OpenApi, OpenApiBuilder, RefOr, Required,
    content::ContentBuilder,
    info::InfoBuilder,
    path::{
        HttpMethod, Operation, OperationBuilder, Parameter, ParameterBuilder, ParameterIn,
        PathItemBuilder, PathsBuilder,
    },
    request_body::{RequestBody, RequestBodyBuilder},
    response::{ResponseBuilder, ResponsesBuilder},
    schema::{ArrayBuilder, ComponentsBuilder, ObjectBuilder, Schema, SchemaFormat, SchemaType, Type},
    security::{HttpAuthScheme, HttpBuilder, SecurityRequirement, SecurityScheme},
};

use sampler_validation::{Constraint, Field, Kind, Location, Schema as InputSchema};

use crate::app::routes::RouteDoc;

const BEARER_SCHEME: &str = "bearerAuth";
const JSON: &str = "application/json";

pub fn build_openapi(title: &str, version: &str, docs: &[RouteDoc]) -> OpenApi {
    // Operations sharing a path template end up in one path item.
    let mut by_path: BTreeMap<String, Vec<(HttpMethod, Operation)>> = BTreeMap::new();
    for doc in docs {
        by_path
            .entry(doc.template_path())
            .or_default()
            .push((doc.method.clone(), operation(doc)));
    }

    let mut paths = PathsBuilder::new();
    for (path, operations) in by_path {
        let mut item = PathItemBuilder::new();
        for (method, op) in operations {
            item = item.operation(method, op);
        }
        paths = paths.path(path, item.build());
    }

    let components = ComponentsBuilder::new()
        .security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        )
        .build();

    OpenApiBuilder::new()
        .info(InfoBuilder::new().title(title).version(version).build())
        .paths(paths.build())
        .components(Some(components))
        .build()
}

fn operation(doc: &RouteDoc) -> Operation {
    let mut op = OperationBuilder::new()
        .summary(Some(doc.summary))
        .description(doc.description)
        .tag(doc.tag);

    if let Some(schema) = doc.schema() {
        for field in schema.fields().iter().filter(|f| f.location() != Location::Body) {
            op = op.parameter(parameter(field));
        }
        op = op.request_body(request_body(schema));
        if schema.fields().iter().any(Field::is_deprecated) {
            op = op.deprecated(Some(Deprecated::True));
        }
    }

    let mut responses = ResponsesBuilder::new().response(
        doc.status.to_string(),
        ResponseBuilder::new()
            .description("Successful Response")
            .content(JSON, ContentBuilder::new().build())
            .build(),
    );
    if doc.schema().is_some() {
        responses = responses.response(
            "422",
            ResponseBuilder::new().description("Validation Error").build(),
        );
    }
    op = op.responses(responses.build());

    if doc.auth {
        op = op.security(SecurityRequirement::new(BEARER_SCHEME, Vec::<String>::new()));
    }
    op.build()
}

fn parameter(field: &Field) -> Parameter {
    let parameter_in = match field.location() {
        Location::Path => ParameterIn::Path,
        Location::Header => ParameterIn::Header,
        Location::Cookie => ParameterIn::Cookie,
        Location::Query | Location::Body => ParameterIn::Query,
    };
    let required = if field.location() == Location::Path || field.is_required() {
        Required::True
    } else {
        Required::False
    };

    ParameterBuilder::new()
        .name(field.wire_name())
        .parameter_in(parameter_in)
        .required(required)
        .description(field.doc_description())
        .deprecated(field.is_deprecated().then_some(Deprecated::True))
        .schema(Some(field_schema(field)))
        .build()
}

fn request_body(schema: &InputSchema) -> Option<RequestBody> {
    let body: Vec<&Field> = schema.body_fields().collect();
    let first = body.first()?;

    let (content, required) = if schema.has_bare_body() {
        (field_schema(first), first.is_required())
    } else {
        (
            object_schema(body.iter().copied()),
            body.iter().any(|f| f.is_required()),
        )
    };

    let mut builder =
        RequestBodyBuilder::new().content(JSON, ContentBuilder::new().schema(Some(content)).build());
    if required {
        builder = builder.required(Some(Required::True));
    }
    Some(builder.build())
}

/// Schema of one field: its kind plus constraints and documentation.
fn field_schema(field: &Field) -> Schema {
    let deprecated = field.is_deprecated().then_some(Deprecated::True);
    match field.kind() {
        Kind::List(inner) | Kind::Set(inner) => Schema::Array(
            ArrayBuilder::new()
                .items(RefOr::T(kind_schema(inner)))
                .unique_items(matches!(field.kind(), Kind::Set(_)))
                .title(field.doc_title())
                .description(field.doc_description())
                .default(field.default_value().cloned())
                .deprecated(deprecated)
                .build(),
        ),
        kind => Schema::Object(
            constrained(scalar_builder(kind), field.constraints())
                .title(field.doc_title())
                .description(field.doc_description())
                .default(field.default_value().cloned())
                .deprecated(deprecated)
                .build(),
        ),
    }
}

/// Schema of a bare kind, e.g. the items of a list.
fn kind_schema(kind: &Kind) -> Schema {
    match kind {
        Kind::List(inner) | Kind::Set(inner) => Schema::Array(
            ArrayBuilder::new()
                .items(RefOr::T(kind_schema(inner)))
                .unique_items(matches!(kind, Kind::Set(_)))
                .build(),
        ),
        other => Schema::Object(scalar_builder(other).build()),
    }
}

fn scalar_builder(kind: &Kind) -> ObjectBuilder {
    let typed = |t: Type| ObjectBuilder::new().schema_type(SchemaType::Type(t));
    match kind {
        Kind::Int => typed(Type::Integer),
        Kind::Float => typed(Type::Number),
        Kind::Bool => typed(Type::Boolean),
        Kind::Str => typed(Type::String),
        Kind::Enum(members) => typed(Type::String).enum_values(Some(members.iter().copied())),
        Kind::Url => typed(Type::String).format(Some(SchemaFormat::Custom("uri".into()))),
        Kind::DateTime => typed(Type::String).format(Some(SchemaFormat::Custom("date-time".into()))),
        Kind::Object(schema) => object_builder(schema.fields().iter()),
        // Callers build arrays themselves.
        Kind::List(_) | Kind::Set(_) => ObjectBuilder::new(),
    }
}

fn object_schema<'a>(fields: impl Iterator<Item = &'a Field>) -> Schema {
    Schema::Object(object_builder(fields).build())
}

fn object_builder<'a>(fields: impl Iterator<Item = &'a Field>) -> ObjectBuilder {
    let mut object = ObjectBuilder::new().schema_type(SchemaType::Type(Type::Object));
    for field in fields {
        object = object.property(field.name(), field_schema(field));
        if field.is_required() {
            object = object.required(field.name());
        }
    }
    object
}

fn constrained(mut builder: ObjectBuilder, constraints: &[Constraint]) -> ObjectBuilder {
    for constraint in constraints {
        builder = match constraint {
            Constraint::MinLength(n) => builder.min_length(Some(*n)),
            Constraint::MaxLength(n) => builder.max_length(Some(*n)),
            Constraint::Gt(bound) => builder.exclusive_minimum(Some(*bound)),
            Constraint::Ge(bound) => builder.minimum(Some(*bound)),
            Constraint::Lt(bound) => builder.exclusive_maximum(Some(*bound)),
            Constraint::Le(bound) => builder.maximum(Some(*bound)),
            Constraint::Pattern(re) => builder.pattern(Some(re.as_str())),
        };
    }
    builder
}
