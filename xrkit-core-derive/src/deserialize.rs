use proc_macro2::TokenStream;
use quote::quote;
use syn::ItemStruct;

use crate::field::FieldInfo;

pub fn derive_deserialize_impl(st: ItemStruct) -> syn::Result<TokenStream> {
    let mut variables = vec![];
    let mut constructor_fields = vec![];
    for (i, field) in st.fields.iter().enumerate() {
        let info = FieldInfo::parse(i, field)?;
        let error = info.error_message("deserialize", &st.ident);
        let FieldInfo {
            member,
            binding,
            ty,
            serialized_when,
        } = info;

        let variable_value = serialized_when
            .map(|cond| {
                quote! {
                    if #cond {
                        ::xrkit_core::binary::Deserialize::deserialize(view)
                            .map(|val| ::std::option::Option::Some(val))
                    } else {
                        ::std::result::Result::Ok(::std::option::Option::None)
                    }
                }
            })
            .unwrap_or_else(|| {
                quote! {
                    ::xrkit_core::binary::Deserialize::deserialize(view)
                }
            });
        variables.push(quote! {
            let #binding: #ty =
                ::xrkit_core::binary::ResultContextExt::context(#variable_value, #error)?;
        });
        constructor_fields.push(quote! { #member: #binding, })
    }

    let type_name = st.ident;
    let (impl_generics, type_generics, where_clause) = st.generics.split_for_impl();
    let variables = TokenStream::from_iter(variables);
    let constructor_fields = TokenStream::from_iter(constructor_fields);

    Ok(quote! {
        impl #impl_generics ::xrkit_core::binary::Deserialize for #type_name #type_generics #where_clause {
            fn deserialize(
                view: &mut ::xrkit_core::binary::ByteView<'_>,
            ) -> ::std::result::Result<Self, ::xrkit_core::binary::Error> {
                #variables
                ::std::result::Result::Ok(Self {
                    #constructor_fields
                })
            }
        }
    })
}
