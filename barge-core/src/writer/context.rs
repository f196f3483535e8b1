#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    #[default]
    None,
    SqlAggregate,
    SqlDeleteFrom,
    SqlDeleteFromWhere,
    SqlInsertInto,
    SqlInsertIntoOutput,
    SqlInsertIntoValues,
    SqlMergeOn,
    SqlMergeSource,
    SqlMergeTarget,
    SqlSelect,
    SqlSelectFrom,
    SqlSelectOrderBy,
    SqlSelectWhere,
    SqlUpdateSet,
    SqlUpdateWhere,
}

impl Fragment {
    /// Alias prefixed to the columns written in this fragment.
    pub fn column_alias(&self) -> Option<&'static str> {
        match self {
            Fragment::SqlMergeSource => Some("S"),
            Fragment::SqlMergeTarget => Some("T"),
            Fragment::SqlInsertIntoOutput => Some("INSERTED"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    /// Parameters written so far.
    pub counter: u32,
    pub fragment: Fragment,
}

impl Context {
    pub fn new(fragment: Fragment) -> Self {
        Self {
            counter: 0,
            fragment,
        }
    }
    pub fn switch_fragment<'s>(&'s mut self, fragment: Fragment) -> ContextUpdater<'s> {
        ContextUpdater {
            current: Context { fragment, ..*self },
            previous: self,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new(Fragment::None)
    }
}

pub struct ContextUpdater<'a> {
    pub current: Context,
    pub previous: &'a mut Context,
}

impl<'a> Drop for ContextUpdater<'a> {
    fn drop(&mut self) {
        self.previous.counter = self.current.counter;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_fragments_keep_the_parameter_count() {
        let mut context = Context::new(Fragment::SqlUpdateSet);
        context.counter = 2;
        {
            let mut inner = context.switch_fragment(Fragment::SqlUpdateWhere);
            assert_eq!(inner.current.fragment, Fragment::SqlUpdateWhere);
            inner.current.counter += 3;
        }
        assert_eq!(context.fragment, Fragment::SqlUpdateSet);
        assert_eq!(context.counter, 5);
        assert_eq!(Fragment::SqlMergeSource.column_alias(), Some("S"));
        assert_eq!(Context::default().fragment.column_alias(), None);
    }
}
