/// Outcome of a project membership lookup. Callers must handle `NotFound`
/// explicitly; there is no implicit default role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipLookup {
    Member { role: String },
    NotFound,
}
