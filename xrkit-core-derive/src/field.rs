use proc_macro2::Ident;
use quote::format_ident;
use syn::{spanned::Spanned, Expr, Field, Index, LitStr, Member, Type};

pub struct FieldInfo {
    /// How the field is accessed on `self` and named in the constructor.
    pub member: Member,
    /// Local variable holding the field while deserializing.
    pub binding: Ident,
    pub ty: Type,
    pub serialized_when: Option<Expr>,
}

impl FieldInfo {
    pub fn parse(index: usize, field: &Field) -> syn::Result<Self> {
        let (member, binding) = match &field.ident {
            Some(ident) => (Member::Named(ident.clone()), ident.clone()),
            None => (
                Member::Unnamed(Index {
                    index: index as u32,
                    span: field.span(),
                }),
                format_ident!("field_{}", index),
            ),
        };

        let serialized_when = field
            .attrs
            .iter()
            .find(|attr| attr.path.is_ident("serialized_when"))
            .map(|attr| attr.parse_args::<Expr>())
            .transpose()?;

        Ok(Self {
            member,
            binding,
            ty: field.ty.clone(),
            serialized_when,
        })
    }

    pub fn error_message(&self, verb: &str, type_name: &Ident) -> LitStr {
        let field_name = match &self.member {
            Member::Named(ident) => ident.to_string(),
            Member::Unnamed(index) => index.index.to_string(),
        };
        LitStr::new(
            &format!("cannot {verb} field {type_name}::{field_name}"),
            self.binding.span(),
        )
    }
}
