//! Records and generic record templates.
//!
//! A record is declared once as a named interface with its fields in
//! declaration order; every use site refers to it by name. Marshalling
//! walks the fields, converting `src.field` into `dest.field`.

use super::{Direction, Resolver};
use crate::emit::CodeBlock;
use crate::names::check_identifier;
use crate::ExportError;
use typewire_core::{Field, GenericRecordDef, RecordDef, TypeDescriptor};

pub fn interface(resolver: &mut Resolver, desc: &TypeDescriptor, def: &RecordDef) -> Result<String, ExportError> {
    if let Some(field) = wrapped_field(desc, def)? {
        return resolver
            .resolve_interface(&field.ty)
            .map_err(|e| in_field(&def.name, &field.name, e));
    }
    check_identifier(&def.name)?;
    let body = body(resolver, &def.name, &def.fields)?;
    resolver.names_mut().register_interface(&def.name, body)
}

/// Registers `Name<T, U>`; parameters inside the body render bare.
pub fn generic_interface(resolver: &mut Resolver, def: &GenericRecordDef) -> Result<String, ExportError> {
    check_identifier(&def.name)?;
    for param in &def.params {
        check_identifier(param)?;
    }
    let body = body(resolver, &def.name, &def.fields)?;
    resolver.names_mut().register_interface(&def.declared_name(), body)
}

pub fn marshal(
    resolver: &mut Resolver,
    desc: &TypeDescriptor,
    def: &RecordDef,
    src: &str,
    dest: &str,
    direction: Direction,
) -> Result<CodeBlock, ExportError> {
    if let Some(field) = wrapped_field(desc, def)? {
        return resolver
            .marshal(&field.ty, src, dest, direction)
            .map_err(|e| in_field(&def.name, &field.name, e));
    }
    fields_marshal(resolver, &def.name, &def.fields, src, dest, direction)
}

/// Field-by-field conversion shared by plain records and generic
/// instantiations.
pub fn fields_marshal(
    resolver: &mut Resolver,
    record: &str,
    fields: &[Field],
    src: &str,
    dest: &str,
    direction: Direction,
) -> Result<CodeBlock, ExportError> {
    let mut block = match direction {
        Direction::ToPrimitive => CodeBlock::line(format!("{} = {{}}", dest)),
        Direction::FromPrimitive => CodeBlock::empty(),
    };
    for field in fields {
        check_identifier(&field.name).map_err(|e| in_field(record, &field.name, e))?;
        let field_block = resolver
            .marshal(
                &field.ty,
                &format!("{}.{}", src, field.name),
                &format!("{}.{}", dest, field.name),
                direction,
            )
            .map_err(|e| in_field(record, &field.name, e))?;
        block.append(field_block);
    }
    Ok(block)
}

/// `{uid: string, tags: Array<Tag<number>>}`
fn body(resolver: &mut Resolver, record: &str, fields: &[Field]) -> Result<String, ExportError> {
    let mut rendered = Vec::with_capacity(fields.len());
    for field in fields {
        check_identifier(&field.name).map_err(|e| in_field(record, &field.name, e))?;
        let ty = resolver
            .resolve_interface(&field.ty)
            .map_err(|e| in_field(record, &field.name, e))?;
        rendered.push(format!("{}: {}", field.name, ty));
    }
    Ok(format!("{{{}}}", rendered.join(", ")))
}

fn wrapped_field<'a>(desc: &TypeDescriptor, def: &'a RecordDef) -> Result<Option<&'a Field>, ExportError> {
    def.wrapped_field()
        .map_err(|e| ExportError::unsupported(desc, e.to_string()))
}

pub(crate) fn in_field(record: &str, field: &str, source: ExportError) -> ExportError {
    ExportError::InField {
        record: record.to_string(),
        field: field.to_string(),
        source: Box::new(source),
    }
}
