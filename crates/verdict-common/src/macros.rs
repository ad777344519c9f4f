/// Dispatches the same expression over every listed variant. Each pattern
/// expands to its own match arm, so the bound value may have a different type
/// per variant.
/// ```rust
/// use verdict_common::enum_dispatch;
///
/// pub enum Failure {
///     NotFound(ContextualError<Value>),
///     Query(ContextualError<QueryContext>)
/// }
///
/// impl Failure {
///    pub fn message(&self) -> &str {
///       enum_dispatch!(self {
///          Self::NotFound(x) |
///          Self::Query(x) => x.message()
///       })
///    }
/// }
///
/// ```
#[macro_export]
macro_rules! enum_dispatch {
    ($self: ident { $($($variant: pat_param)|* => $do: expr),+ }) => {
        match $self {
            $(
                $($variant => $do),+
            ),+
        }
    };
}
