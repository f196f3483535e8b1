use crate::decode_table::TableMetadata;
use proc_macro2::TokenStream;
use quote::quote;

/// Body of `Entity::from_row`.
///
/// Labels are matched ASCII case-insensitively, unknown labels are skipped. A persisted column
/// missing from the row is decoded from `NULL`, which fails for non nullable fields. Ignored
/// fields take their default value.
pub(crate) fn from_row(table: &TableMetadata) -> TokenStream {
    let struct_name = &table.item.ident;
    let holders = table.persisted().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        quote!(let mut #ident: Option<#ty> = None;)
    });
    let assignments = table.persisted().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        let name = &c.name;
        quote! {
            if __label__.eq_ignore_ascii_case(#name) {
                #ident = Some(::barge::Context::with_context(
                    <#ty as ::barge::AsValue>::try_from_value(__value__),
                    || format!("While decoding the column `{}` of `{}`", #name, stringify!(#struct_name)),
                )?);
                continue;
            }
        }
    });
    let fields = table.columns.iter().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        let name = &c.name;
        if c.ignore {
            quote!(#ident: ::std::default::Default::default())
        } else {
            quote! {
                #ident: match #ident {
                    Some(v) => v,
                    None => ::barge::Context::with_context(
                        <#ty as ::barge::AsValue>::try_from_value(::barge::Value::Null),
                        || format!("Column `{}` does not exist in the row provided", #name),
                    )?,
                }
            }
        }
    });
    quote! {
        #(#holders)*
        for (__label__, __value__) in ::std::iter::zip(row.labels.iter(), row.values.into_vec()) {
            #(#assignments)*
        }
        Ok(#struct_name {
            #(#fields,)*
        })
    }
}
