//! Parsing of `#[kanon(...)]` attributes.

use syn::{
    punctuated::Punctuated, spanned::Spanned, Attribute, Expr, ExprLit, Field, Ident, Lit, Meta,
    Token, Type,
};

/// Settings collected from a member's `#[kanon(...)]` attributes.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    /// Wire key, optionally followed by `,omitempty`.
    pub wire: Option<String>,
    /// Validator list, e.g. `required,min=2`.
    pub rules: Option<String>,
    /// Default literal.
    pub default: Option<String>,
    /// Timestamp layout.
    pub layout: Option<String>,
    /// Custom format id.
    pub spec: Option<String>,
    /// Skip on encode when empty.
    pub omit_empty: bool,
    /// Leave the member out of the contract entirely.
    pub skip: bool,
    /// Any other `name = "value"` pair, kept verbatim.
    pub extra: Vec<(String, String)>,
}

impl FieldAttrs {
    /// Collects every `#[kanon(...)]` attribute on `attrs`.
    pub fn from_attributes(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("kanon")) {
            let metas = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
            for meta in metas {
                parsed.apply(meta)?;
            }
        }
        Ok(parsed)
    }

    fn apply(&mut self, meta: Meta) -> syn::Result<()> {
        match meta {
            Meta::Path(path) => {
                let ident = path
                    .get_ident()
                    .ok_or_else(|| syn::Error::new(path.span(), "expected identifier"))?;
                match ident.to_string().as_str() {
                    "omit_empty" => self.omit_empty = true,
                    "skip" => self.skip = true,
                    other => {
                        return Err(syn::Error::new(
                            ident.span(),
                            format!("unknown kanon flag: {other}"),
                        ))
                    }
                }
            }
            Meta::NameValue(nv) => {
                let ident = nv
                    .path
                    .get_ident()
                    .ok_or_else(|| syn::Error::new(nv.path.span(), "expected identifier"))?
                    .to_string();
                let value = match &nv.value {
                    Expr::Lit(ExprLit {
                        lit: Lit::Str(s), ..
                    }) => s.value(),
                    _ => {
                        return Err(syn::Error::new(
                            nv.value.span(),
                            "expected string literal",
                        ))
                    }
                };
                match ident.as_str() {
                    "wire" => self.wire = Some(value),
                    "rules" => self.rules = Some(value),
                    "default" => self.default = Some(value),
                    "layout" => self.layout = Some(value),
                    "spec" => self.spec = Some(value),
                    _ => self.extra.push((ident, value)),
                }
            }
            Meta::List(list) => {
                return Err(syn::Error::new(list.span(), "expected name = value or a flag"))
            }
        }
        Ok(())
    }
}

/// A named record member.
#[derive(Debug)]
pub struct ContractField {
    /// Rust field name, used as the binding name.
    pub ident: Ident,
    /// Declared type.
    pub ty: Type,
    /// Parsed attributes.
    pub attrs: FieldAttrs,
}

impl ContractField {
    /// Parses one named field.
    pub fn from_field(field: &Field) -> syn::Result<Self> {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new(field.span(), "Contract needs named fields"))?;
        Ok(Self {
            ident,
            ty: field.ty.clone(),
            attrs: FieldAttrs::from_attributes(&field.attrs)?,
        })
    }

    /// Binding name with any raw identifier prefix removed.
    pub fn binding(&self) -> String {
        let name = self.ident.to_string();
        name.strip_prefix("r#").map(str::to_string).unwrap_or(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn field(field: Field) -> ContractField {
        ContractField::from_field(&field).unwrap()
    }

    #[test]
    fn test_parse_all_settings() {
        let parsed = field(parse_quote! {
            #[kanon(wire = "user_id", rules = "required,oneof=1 2 5", default = "1")]
            #[kanon(omit_empty, vendor = "x-int")]
            pub id: u32
        });
        assert_eq!(parsed.binding(), "id");
        assert_eq!(parsed.attrs.wire.as_deref(), Some("user_id"));
        assert_eq!(parsed.attrs.rules.as_deref(), Some("required,oneof=1 2 5"));
        assert_eq!(parsed.attrs.default.as_deref(), Some("1"));
        assert!(parsed.attrs.omit_empty);
        assert_eq!(parsed.attrs.extra, vec![("vendor".to_string(), "x-int".to_string())]);
    }

    #[test]
    fn test_other_attributes_are_ignored() {
        let parsed = field(parse_quote! {
            #[doc = "Creation time."]
            #[kanon(layout = "%Y-%m-%d")]
            r#type: String
        });
        assert_eq!(parsed.binding(), "type");
        assert_eq!(parsed.attrs.layout.as_deref(), Some("%Y-%m-%d"));
    }

    #[test]
    fn test_unknown_flag_rejected() {
        let field: Field = parse_quote! {
            #[kanon(required)]
            name: String
        };
        let err = ContractField::from_field(&field).unwrap_err();
        assert!(err.to_string().contains("unknown kanon flag"));
    }

    #[test]
    fn test_non_string_value_rejected() {
        let field: Field = parse_quote! {
            #[kanon(default = 25)]
            age: u8
        };
        assert!(ContractField::from_field(&field).is_err());
    }
}
