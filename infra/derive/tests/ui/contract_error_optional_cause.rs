use lazycontract_derive::contract_error;
use std::borrow::Cow;
use std::error::Error as _;

#[contract_error]
pub enum DemoError {
    #[error("{label}{}", format_context(.context))]
    Wrapped {
        label: Cow<'static, str>,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: Option<Cow<'static, str>>,
    },
}

fn main() {
    let bare = DemoError::Wrapped { label: "bare".into(), cause: None, context: None };
    assert!(bare.source().is_none());

    let wrapped = DemoError::Wrapped {
        label: "wrapped".into(),
        cause: Some(Box::new(std::io::Error::other("inner"))),
        context: None,
    };
    assert!(wrapped.source().is_some());

    let with_context: Result<(), DemoError> = Err(wrapped);
    let err = with_context.context("outer").unwrap_err();
    assert_eq!(err.to_string(), "wrapped (outer)");
}
