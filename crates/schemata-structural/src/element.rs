//! Elements of a structural schema: one per declared record field.

use schemata_core::{FieldDescriptor, Metadata, NativeType, SchemaElement, SchemaId, TypeAnnotation};

/// A record field viewed as a schema element.
///
/// Required exactly when the field has no default.
#[derive(Debug, Clone)]
pub struct StructuralElement {
    owner: SchemaId,
    descriptor: FieldDescriptor,
}

impl StructuralElement {
    pub(crate) fn new(owner: SchemaId, descriptor: FieldDescriptor) -> Self {
        Self { owner, descriptor }
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }
}

impl SchemaElement for StructuralElement {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn native_type(&self) -> NativeType {
        self.descriptor.native_type.clone()
    }

    fn annotation(&self) -> Option<TypeAnnotation> {
        Some(
            TypeAnnotation::from_parts(!self.descriptor.has_default(), self.descriptor.default.clone())
                .with_metadata(self.descriptor.metadata.clone()),
        )
    }

    fn owner(&self) -> Option<SchemaId> {
        Some(self.owner)
    }

    fn metadata(&self) -> Metadata {
        self.descriptor.metadata.clone()
    }

    fn field_descriptor(&self) -> FieldDescriptor {
        self.descriptor.clone()
    }
}
