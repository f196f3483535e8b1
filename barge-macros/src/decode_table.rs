use crate::decode_column::{ColumnMetadata, decode_column};
use convert_case::{Case, Casing};
use quote::ToTokens;
use syn::{ItemStruct, LitStr, parse::ParseBuffer};

pub(crate) struct TableMetadata {
    pub(crate) item: ItemStruct,
    pub(crate) name: String,
    pub(crate) schema: String,
    /// Every field of the struct, ignored ones included.
    pub(crate) columns: Vec<ColumnMetadata>,
}

impl TableMetadata {
    /// The persisted columns, in declaration order.
    pub(crate) fn persisted(&self) -> impl Iterator<Item = &ColumnMetadata> + Clone {
        self.columns.iter().filter(|c| !c.ignore)
    }
}

pub(crate) fn decode_table(item: ItemStruct) -> TableMetadata {
    let columns: Vec<_> = item.fields.iter().map(decode_column).collect();
    let mut name = item.ident.to_string().to_case(Case::Snake);
    let mut schema = String::new();
    if name.starts_with('_') {
        name.remove(0);
    }
    for attr in &item.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("barge") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `barge`, use it like: `#[barge(attribute = value, ..)]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("table_name") {
                let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!(
                        "Error while parsing `table_name`, use it like: `#[barge(table_name = \"my_table\")]`"
                    );
                };
                name = value.value();
            } else if arg.path.is_ident("schema_name") {
                let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!(
                        "Error while parsing `schema_name`, use it like: `#[barge(schema_name = \"dbo\")]`"
                    );
                };
                schema = value.value();
            } else {
                panic!(
                    "Unknown attribute `{}` inside barge macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
    }
    let primary_keys = columns.iter().filter(|c| c.primary_key && !c.ignore).count();
    if primary_keys > 1 {
        panic!(
            "Entity `{}` declares {} primary key columns, at most one is supported",
            item.ident, primary_keys
        );
    }
    if columns.iter().filter(|c| c.identity && !c.ignore).count() > 1 {
        panic!("Entity `{}` declares more than one identity column", item.ident);
    }
    TableMetadata {
        item,
        name,
        schema,
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn default_table_name_is_snake_case() {
        let table = decode_table(parse_quote! {
            struct CustomerOrder {
                id: i32,
                #[barge(ignore)]
                cache: Vec<u8>,
            }
        });
        assert_eq!(table.name, "customer_order");
        assert_eq!(table.schema, "");
        assert_eq!(table.persisted().count(), 1);
    }

    #[test]
    fn table_attributes() {
        let table = decode_table(parse_quote! {
            #[barge(table_name = "People", schema_name = "dbo")]
            struct Person {
                #[barge(primary_key)]
                id: i32,
            }
        });
        assert_eq!(table.name, "People");
        assert_eq!(table.schema, "dbo");
    }

    #[test]
    #[should_panic(expected = "at most one is supported")]
    fn composite_keys_are_rejected() {
        decode_table(parse_quote! {
            struct Pair {
                #[barge(primary_key)]
                a: i32,
                #[barge(primary_key)]
                b: i32,
            }
        });
    }
}
