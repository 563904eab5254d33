#![allow(dead_code)]
/*!

A pattern-matching compiler. Given a scrutinee expression and an ordered list of
`pattern => result` arms, it produces straight-line host code that evaluates the scrutinee once
and dispatches to the first matching arm's result, binding pattern variables on the way. Arms are
compiled into a deduplicated decision automaton so that common subcomputations (type checks,
field fetches, length checks, equality tests) are shared across arms rather than repeated.

The pipeline:

1. The binder lowers surface patterns into a bound-pattern algebra that distinguishes *fetches*
   (pure projections over the scrutinee) from *tests* (boolean predicates).
2. The automaton builder constructs a decision automaton whose nodes are sets of
   partially-matched arms, choosing a next action per node and simplifying arms relative to the
   chosen action's outcome.
3. The minimizer deduplicates behaviorally equivalent automaton nodes bottom-up.
4. The emitter lays the minimized automaton out as sequential statements with labeled jumps,
   inserting labels only where fall-through is impossible.

Entry points live in [`api`]: [`api::compile_match`], the brute-force oracle
[`api::compile_match_reference`], the boolean form [`api::compile_is_match`], and the unary form
[`api::compile_assignment`].

*/

pub mod api;
mod core;

#[cfg(test)]
mod tests;
