mod decode_column;
mod decode_table;
mod from_row;

use decode_table::decode_table;
use from_row::from_row;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

/// Implements `Entity` and `RowLike` for a struct with named fields.
///
/// Struct attributes: `#[barge(table_name = "..", schema_name = "..")]`, the table name
/// defaults to the snake case type name. Field attributes: `#[barge(column_name = "..",
/// primary_key, identity, generated, ignore)]`.
#[proc_macro_derive(Entity, attributes(barge))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let table = decode_table(parse_macro_input!(input as ItemStruct));
    let name = &table.item.ident;
    let (impl_generics, ty_generics, where_clause) = table.item.generics.split_for_impl();
    let table_name = &table.name;
    let schema_name = &table.schema;
    let db_fields = table.persisted().map(|c| {
        let column = &c.name;
        let ty = &c.ty;
        let mut result = quote! {
            ::barge::DbField::new(#column)
                .with_type(<#ty as ::barge::AsValue>::as_empty_value())
        };
        if c.primary_key {
            result = quote!(#result.primary());
        }
        if c.identity {
            result = quote!(#result.identity());
        }
        if c.generated {
            result = quote!(#result.generated());
        }
        if !c.nullable {
            result = quote!(#result.not_null());
        }
        result
    });
    let field_values = table.persisted().enumerate().map(|(i, c)| {
        let ident = &c.ident;
        quote!(#i => Some(::barge::AsValue::as_value(::std::clone::Clone::clone(&self.#ident))))
    });
    let from_row = from_row(&table);
    quote! {
        impl #impl_generics ::barge::Entity for #name #ty_generics #where_clause {
            fn table_ref() -> &'static ::barge::TableRef {
                static TABLE_REF: ::barge::TableRef =
                    ::barge::TableRef::with_schema(#schema_name, #table_name);
                &TABLE_REF
            }

            fn db_fields() -> &'static ::barge::DbFields {
                static DB_FIELDS: ::std::sync::LazyLock<::barge::DbFields> =
                    ::std::sync::LazyLock::new(|| ::barge::DbFields::new(vec![#(#db_fields),*]));
                &DB_FIELDS
            }

            fn field_value(&self, index: usize) -> Option<::barge::Value> {
                match index {
                    #(#field_values,)*
                    _ => None,
                }
            }

            fn from_row(row: ::barge::RowLabeled) -> ::barge::Result<Self> {
                #from_row
            }
        }

        impl #impl_generics ::barge::RowLike for #name #ty_generics #where_clause {
            fn row_shape(&self) -> ::barge::RowShape {
                ::barge::RowShape::Entity {
                    type_name: ::std::any::type_name::<Self>(),
                    table: ::std::clone::Clone::clone(<Self as ::barge::Entity>::table_ref()),
                    db_fields: <Self as ::barge::Entity>::db_fields(),
                }
            }

            fn value_at(&self, index: usize, _name: &str) -> Option<::barge::Value> {
                <Self as ::barge::Entity>::field_value(self, index)
            }
        }
    }
    .into()
}
