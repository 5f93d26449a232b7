use crate::BuildError;
use convert_case::{Case, Casing};
use quote::quote;
use std::path::Path;

///
/// GeneratedUnit
/// In-memory description of a synthesized adapter type bound to exactly
/// one embedded model resource. The binding is data-driven: a resource
/// name string, never a hand-written subclass. Consumed by compilation
/// and archiving.
///

#[derive(Clone, Debug)]
pub struct GeneratedUnit {
    type_name: String,
    module_name: String,
    model_base_name: String,
    resource_name: String,
    source: String,
}

impl GeneratedUnit {
    /// Render a new adapter type named `type_name`, bound to
    /// `"/" + model_file.base_name`. The sole constructor delegates to the
    /// adapter base with that resource; `func_name` returns the type's own
    /// name, overriding the inherited default.
    pub fn bind(type_name: &str, model_file: &Path) -> Result<Self, BuildError> {
        let ident: syn::Ident =
            syn::parse_str(type_name).map_err(|_| BuildError::InvalidTypeName {
                name: type_name.to_string(),
            })?;

        let model_base_name = model_file
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| BuildError::InvalidModelPath {
                path: model_file.to_path_buf(),
            })?
            .to_string();

        let resource_name = format!("/{model_base_name}");
        let module_name = type_name.to_case(Case::Snake);

        let base_lit = model_base_name.as_str();
        let resource_lit = resource_name.as_str();

        let tokens = quote! {
            use modelfn_core::{EmbeddedResource, EvaluatorFn, NegotiateError, ScalarFunction, UdfError};
            use modelfn_schema::{HostValue, RecordSchema};

            pub struct #ident {
                inner: EvaluatorFn,
            }

            impl #ident {
                #[must_use]
                pub fn new() -> Self {
                    Self {
                        inner: EvaluatorFn::new(EmbeddedResource::new(
                            #resource_lit,
                            include_bytes!(#base_lit),
                        )),
                    }
                }
            }

            impl Default for #ident {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl ScalarFunction for #ident {
                fn func_name(&self) -> &str {
                    #type_name
                }

                fn negotiate(&self, args: &[RecordSchema]) -> Result<RecordSchema, NegotiateError> {
                    self.inner.negotiate(args)
                }

                fn evaluate(&self, row: &[HostValue]) -> Result<Vec<HostValue>, UdfError> {
                    self.inner.evaluate(row)
                }
            }
        };

        Ok(Self {
            type_name: type_name.to_string(),
            module_name,
            model_base_name,
            resource_name,
            source: tokens.to_string(),
        })
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    #[must_use]
    pub fn model_base_name(&self) -> &str {
        &self.model_base_name
    }

    #[must_use]
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

///
/// TESTS
///
