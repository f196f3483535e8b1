use quote::ToTokens;
use syn::{Field, GenericArgument, Ident, LitStr, PathArguments, Type, TypePath, parse::ParseBuffer};

pub(crate) struct ColumnMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) nullable: bool,
    pub(crate) primary_key: bool,
    pub(crate) identity: bool,
    pub(crate) generated: bool,
    pub(crate) ignore: bool,
}

/// `Some(T)` when `ty` is `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(TypePath { qself: None, path }) = ty else {
        return None;
    };
    let segment = path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return None;
    };
    match arguments.args.first()? {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    }
}

fn flag(arg: &syn::meta::ParseNestedMeta, name: &str) {
    let Err(..) = arg.value() else {
        panic!("Error while parsing `{name}`, use it like: `#[barge({name})]`");
    };
}

pub(crate) fn decode_column(field: &Field) -> ColumnMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Entity fields are expected to have a name");
    let mut name = ident.to_string();
    if name.starts_with('_') {
        name.remove(0);
    }
    let mut metadata = ColumnMetadata {
        ident,
        ty: field.ty.clone(),
        name,
        nullable: option_inner(&field.ty).is_some(),
        primary_key: false,
        identity: false,
        generated: false,
        ignore: false,
    };
    for attr in &field.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("barge") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `barge`, use it like: `#[barge(attribute = value, ..)]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("column_name") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!(
                        "Error while parsing `column_name`, use it like: `#[barge(column_name = \"MyColumn\")]`"
                    );
                };
                metadata.name = v.value();
            } else if arg.path.is_ident("primary_key") {
                flag(&arg, "primary_key");
                metadata.primary_key = true;
                metadata.nullable = false;
            } else if arg.path.is_ident("identity") {
                flag(&arg, "identity");
                metadata.identity = true;
            } else if arg.path.is_ident("generated") {
                flag(&arg, "generated");
                metadata.generated = true;
            } else if arg.path.is_ident("ignore") {
                flag(&arg, "ignore");
                metadata.ignore = true;
            } else {
                panic!(
                    "Unknown attribute `{}` inside barge macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
    }
    metadata
}
