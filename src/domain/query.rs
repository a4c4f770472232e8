//! # Query Front-End (C6)
//!
//! The query AST a front-end (parser, REPL, RPC handler — all outside
//! this crate's scope, per spec.md §1) must produce, and its translation
//! into the `EVALUATION_LINK`/`INHERITANCE_LINK` templates the pattern
//! matcher consumes. Mirrors the EBNF in spec.md §6:
//!
//! ```text
//! query   ::= "SELECT" var+ "WHERE" "{" clause+ "}"
//! clause  ::= triple | isa
//! triple  ::= term term term          ; (predicate, arg1, arg2) -> EvaluationLink
//! isa     ::= term "isa" term         ; child, parent -> InheritanceLink
//! term    ::= var | name
//! var     ::= "$" identifier (":" type)?
//! ```

use crate::domain::atom::Handle;
use crate::domain::errors::MatchError;
use crate::domain::store::AtomSpace;
use crate::domain::type_hierarchy::AtomType;

/// A term in a query clause: either a variable reference (by name, with
/// an optional type restriction) or a concrete atom name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Var { name: String, restriction: Option<String> },
    Name(String),
}

/// One WHERE clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// `(predicate arg1 arg2)` -> an `EVALUATION_LINK` over a `LIST_LINK`.
    Triple { predicate: Term, arg1: Term, arg2: Term },
    /// `child isa parent` -> an `INHERITANCE_LINK`.
    Isa { child: Term, parent: Term },
}

/// A full `SELECT ... WHERE { ... }` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub select: Vec<String>,
    pub clauses: Vec<Clause>,
}

/// Translates a `Query` into pattern-matcher template handles, materializing
/// any variable/name terms as atoms in `space` as it goes (concrete names as
/// `PREDICATE_NODE`/`CONCEPT_NODE`, variables as `VARIABLE_NODE`).
pub struct QueryTranslator<'a> {
    space: &'a AtomSpace,
}

impl<'a> QueryTranslator<'a> {
    pub fn new(space: &'a AtomSpace) -> Self {
        Self { space }
    }

    /// Translate every clause into a matcher-ready template handle, and
    /// return the handles of the named `SELECT` variables so the caller
    /// can read them back out of each `MatchResult`'s bindings.
    pub fn translate(&self, query: &Query) -> Result<(Vec<Handle>, Vec<Handle>), MatchError> {
        if query.clauses.is_empty() {
            return Err(MatchError::EmptyQuery);
        }
        let mut templates = Vec::with_capacity(query.clauses.len());
        for clause in &query.clauses {
            templates.push(self.translate_clause(clause)?);
        }
        let select_handles = query
            .select
            .iter()
            .map(|name| self.term_handle(&Term::Var { name: name.clone(), restriction: None }))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((templates, select_handles))
    }

    fn translate_clause(&self, clause: &Clause) -> Result<Handle, MatchError> {
        let hierarchy = self.space.type_hierarchy();
        match clause {
            Clause::Triple { predicate, arg1, arg2 } => {
                let predicate_h = self.term_handle(predicate)?;
                let arg1_h = self.term_handle(arg1)?;
                let arg2_h = self.term_handle(arg2)?;
                let list_t = hierarchy.read().id_of(AtomType::LIST_LINK).unwrap();
                let eval_t = hierarchy.read().id_of(AtomType::EVALUATION_LINK).unwrap();
                let args = self
                    .space
                    .add_link(list_t, vec![arg1_h, arg2_h], crate::domain::truth_value::TruthValue::DEFAULT)
                    .map_err(|_| MatchError::UnboundVariable("list link closure".into()))?;
                self.space
                    .add_link(eval_t, vec![predicate_h, args], crate::domain::truth_value::TruthValue::DEFAULT)
                    .map_err(|_| MatchError::UnboundVariable("evaluation link closure".into()))
            }
            Clause::Isa { child, parent } => {
                let child_h = self.term_handle(child)?;
                let parent_h = self.term_handle(parent)?;
                let inh_t = hierarchy.read().id_of(AtomType::INHERITANCE_LINK).unwrap();
                self.space
                    .add_link(inh_t, vec![child_h, parent_h], crate::domain::truth_value::TruthValue::DEFAULT)
                    .map_err(|_| MatchError::UnboundVariable("inheritance link closure".into()))
            }
        }
    }

    fn term_handle(&self, term: &Term) -> Result<Handle, MatchError> {
        let hierarchy = self.space.type_hierarchy();
        match term {
            Term::Name(name) => {
                let concept_t = hierarchy.read().id_of(AtomType::CONCEPT_NODE).unwrap();
                Ok(self
                    .space
                    .add_node(concept_t, name.clone(), crate::domain::truth_value::TruthValue::DEFAULT))
            }
            Term::Var { name, restriction } => {
                let var_t = hierarchy.read().id_of(AtomType::VARIABLE_NODE).unwrap();
                let restriction_id = match restriction {
                    Some(type_name) => Some(
                        hierarchy
                            .read()
                            .id_of(type_name)
                            .ok_or_else(|| MatchError::TypeMismatch {
                                expected: type_name.clone(),
                                found: "<unregistered type>".to_string(),
                            })?,
                    ),
                    None => None,
                };
                Ok(self.space.add_variable(var_t, name.clone(), restriction_id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_is_rejected() {
        let space = AtomSpace::new();
        let query = Query { select: vec![], clauses: vec![] };
        let err = QueryTranslator::new(&space).translate(&query).unwrap_err();
        assert!(matches!(err, MatchError::EmptyQuery));
    }

    #[test]
    fn isa_clause_translates_to_inheritance_link_template() {
        let space = AtomSpace::new();
        let query = Query {
            select: vec!["$x".to_string()],
            clauses: vec![Clause::Isa {
                child: Term::Var { name: "$x".to_string(), restriction: Some(AtomType::CONCEPT_NODE.to_string()) },
                parent: Term::Name("animal".to_string()),
            }],
        };
        let (templates, select) = QueryTranslator::new(&space).translate(&query).unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(select.len(), 1);
    }
}
