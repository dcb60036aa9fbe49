//! Fixture corpus and differential harness
//!
//! A battery of grammars and golden renderings exercised against either
//! parser. [`execute`] runs the whole corpus and reports every divergence
//! with the grammar name, case name, input and both renderings, so the
//! two parsers can be compared case by case.
//!
//! Expected values are `None` for inputs the grammar must reject.

use crate::error::ParseError;
use crate::grammar::{Grammar, GrammarBuilder, GrammarError};
use crate::lexer::Lexer;
use crate::operator::Op;
use crate::token::Token;
use crate::tree::Node;

/// The signature both parsers share
pub type ParserFn = fn(&Grammar, &[Token]) -> Result<Node, ParseError>;

/// Collects fixture outcomes for one parser
pub struct TestRun {
    parser: ParserFn,
    lexer: Lexer,
    grammar: Option<Grammar>,
    grammar_name: String,
    case_name: String,
    case_index: usize,
    count: usize,
    failures: Vec<String>,
}

impl TestRun {
    /// Start a run for the given parser
    pub fn new(parser: ParserFn) -> Self {
        Self {
            parser,
            lexer: Lexer::new(),
            grammar: None,
            grammar_name: String::new(),
            case_name: String::new(),
            case_index: 0,
            count: 0,
            failures: Vec::new(),
        }
    }

    /// Select the grammar subsequent cases parse against
    pub fn set_grammar(&mut self, grammar: Grammar, name: &str) {
        self.grammar = Some(grammar);
        self.grammar_name = name.to_string();
    }

    /// Name the current case group
    pub fn set_case(&mut self, name: &str) {
        self.case_name = name.to_string();
        self.case_index = 0;
    }

    /// Check one input against its golden rendering (`None` = rejected)
    pub fn case(&mut self, source: &str, expected: Option<&str>) {
        let rendered = match (&self.grammar, self.lexer.tokenize(source)) {
            (Some(grammar), Ok(tokens)) => {
                (self.parser)(grammar, &tokens).ok().map(|node| node.render())
            }
            _ => None,
        };
        if rendered.as_deref() != expected {
            self.failures.push(format!(
                "{}/{} [{}] `{}`: got {:?}, expected {:?}",
                self.grammar_name,
                self.case_name,
                self.case_index,
                source,
                rendered,
                expected
            ));
        }
        self.case_index += 1;
        self.count += 1;
    }

    /// Record a failure when a malformed grammar slipped past the builder
    pub fn expect_grammar_error(&mut self, result: Result<Grammar, GrammarError>, what: &str) {
        self.count += 1;
        if result.is_ok() {
            self.failures
                .push(format!("builder accepted {}", what));
        }
    }

    /// Finish the run; `Ok` carries the case count
    pub fn finish(self) -> Result<usize, Vec<String>> {
        if self.failures.is_empty() {
            Ok(self.count)
        } else {
            Err(self.failures)
        }
    }
}

/// Run the whole corpus against one parser
pub fn execute(parser: ParserFn) -> Result<usize, Vec<String>> {
    let mut run = TestRun::new(parser);
    basic(&mut run);
    low_postfix(&mut run);
    pq_notation(&mut run);
    ternary_ltr(&mut run);
    parentheses(&mut run);
    concat(&mut run);
    cpp(&mut run);
    run.finish()
}

/// The everyday operator table: calls, subscripts, unary and binary
/// arithmetic, a flat addition level, ternary and assignment
pub fn basic_grammar() -> Grammar {
    GrammarBuilder::new()
        .level_rtl("cal", vec![Op::infix(".")])
        .level_ltr("sqb", vec![Op::postfix_bracketed("[", "]")])
        .level_ltr("var", vec![Op::postfix("$")])
        .level_ltr("exc", vec![Op::postfix("!")])
        .level_rtl("til", vec![Op::prefix("~")])
        .level_rtl("prf", vec![Op::prefix("+"), Op::prefix("-")])
        .level_ltr("mul", vec![Op::infix("*"), Op::infix("/")])
        .level_flat("add", vec![Op::infix("+"), Op::infix("-")])
        .level_rtl("ter", vec![Op::ternary("?", ":")])
        .level_rtl("eqa", vec![Op::infix("=")])
        .finish()
        .expect("basic grammar is well formed")
}

fn basic(run: &mut TestRun) {
    run.set_grammar(basic_grammar(), "base");

    run.set_case("infix");
    run.case("1", Some("1"));
    run.case("1 + 2", Some("add{ 1 + 2 }"));
    run.case("1 + 2 * 3", Some("add{ 1 + mul{ 2 * 3 } }"));
    run.case("f . g . h", Some("cal{ f . cal{ g . h } }"));

    run.set_case("infix-flat");
    run.case("1 + 2 * 3 + 4", Some("add{ 1 + mul{ 2 * 3 } + 4 }"));
    run.case("1 + 2 + 3 - 4 + 5", Some("add{ 1 + 2 + 3 - 4 + 5 }"));
    run.case(
        "1 + 2 * a ! + 3 - 4 + 5",
        Some("add{ 1 + mul{ 2 * exc{ a ! } } + 3 - 4 + 5 }"),
    );
    run.case("a + b * c * d + e", Some("add{ a + mul{ mul{ b * c } * d } + e }"));
    run.case("a + b - c + d", Some("add{ a + b - c + d }"));
    run.case(
        "1 + 2 + f . g . h * 3 * 4",
        Some("add{ 1 + 2 + mul{ mul{ cal{ f . cal{ g . h } } * 3 } * 4 } }"),
    );

    run.set_case("allfix");
    run.case("2 ! + 3", Some("add{ exc{ 2 ! } + 3 }"));
    run.case("+ 1", Some("prf{ + 1 }"));
    run.case("+ ~ 1", Some("prf{ + til{ ~ 1 } }"));
    run.case("~ + 1", None);
    run.case("1 $ !", Some("exc{ var{ 1 $ } ! }"));
    run.case("1 ! $", None);
    run.case("- + 1", Some("prf{ - prf{ + 1 } }"));
    run.case("1 + + - 1", Some("add{ 1 + prf{ + prf{ - 1 } } }"));
    run.case("- - 1 * 2", Some("mul{ prf{ - prf{ - 1 } } * 2 }"));
    run.case("- - f . g", Some("prf{ - prf{ - cal{ f . g } } }"));
    run.case("- 9 !", Some("prf{ - exc{ 9 ! } }"));
    run.case("f . g !", Some("exc{ cal{ f . g } ! }"));
    run.case("+ f . + g", None);
    run.case("+ f . + g . + h", None);
    run.case("+ f + g", Some("add{ prf{ + f } + g }"));
    run.case("+ f . g", Some("prf{ + cal{ f . g } }"));
    run.case("+ f + + g", Some("add{ prf{ + f } + prf{ + g } }"));
    run.case("f ! . g !", None);
    run.case("f ! . g ! . h !", None);
    run.case("f + g !", Some("add{ f + exc{ g ! } }"));
    run.case("f ! + g !", Some("add{ exc{ f ! } + exc{ g ! } }"));

    run.set_case("parentheses");
    run.case("( ( ( 0 ) ) )", Some("0"));
    run.case("( 1 + 2 ) * 3", Some("mul{ add{ 1 + 2 } * 3 }"));
    run.case("1 + ( 2 * 3 )", Some("add{ 1 + mul{ 2 * 3 } }"));

    run.set_case("subscript");
    run.case("a [ 0 ]", Some("sqb{ a [ 0 ] }"));
    run.case("a [ 0 ] [ 1 ]", Some("sqb{ sqb{ a [ 0 ] } [ 1 ] }"));
    run.case(
        "a [ 0 ] [ b [ 0 + 1 ] ]",
        Some("sqb{ sqb{ a [ 0 ] } [ sqb{ b [ add{ 0 + 1 } ] } ] }"),
    );
    run.case("a [ 0 ] . b [ 0 ]", None);
    run.case("a [ 0 ] + b [ 0 ]", Some("add{ sqb{ a [ 0 ] } + sqb{ b [ 0 ] } }"));

    run.set_case("ternary");
    run.case("a ? b : c", Some("ter{ a ? b : c }"));
    run.case("a ? b : c ? d : e", Some("ter{ a ? b : ter{ c ? d : e } }"));
    run.case("a ? b ? c : d : e", Some("ter{ a ? ter{ b ? c : d } : e }"));
    run.case("a = b ? c : d = e", Some("eqa{ a = eqa{ ter{ b ? c : d } = e } }"));
    run.case("a + b ? c : d + e", Some("ter{ add{ a + b } ? c : add{ d + e } }"));
    run.case(
        "a = b ? c = d : e = f",
        Some("eqa{ a = eqa{ ter{ b ? eqa{ c = d } : e } = f } }"),
    );
    run.case(
        "a + b ? c + d : e + f",
        Some("ter{ add{ a + b } ? add{ c + d } : add{ e + f } }"),
    );
}

fn low_postfix(run: &mut TestRun) {
    let grammar = GrammarBuilder::new()
        .level_flat("cal", vec![Op::infix(".")])
        .level_ltr("exc", vec![Op::postfix("!")])
        .finish()
        .expect("low-postfix grammar is well formed");
    run.set_grammar(grammar, "low-postfix");

    run.set_case("flat");
    run.case("a . b . c . d", Some("cal{ a . b . c . d }"));
    run.case("a ! . b . c . d", None);
    run.case("a . b ! . c . d", None);
    run.case("a . b . c . d !", Some("exc{ cal{ a . b . c . d } ! }"));
}

fn pq_notation(run: &mut TestRun) {
    let grammar = GrammarBuilder::new()
        .level_ltr("l1", vec![Op::postfix("q4")])
        .level_ltr("l2", vec![Op::postfix("q3")])
        .level_rtl("l3", vec![Op::prefix("p4")])
        .level_rtl("l4", vec![Op::prefix("p3")])
        .level_rtl("l5", vec![Op::infix("x2")])
        .level_ltr("l6", vec![Op::infix("x1")])
        .level_ltr("l7", vec![Op::postfix("q2")])
        .level_ltr("l8", vec![Op::postfix("q1")])
        .level_rtl("l9", vec![Op::prefix("p2")])
        .level_rtl("l10", vec![Op::prefix("p1")])
        .finish()
        .expect("pq grammar is well formed");
    run.set_grammar(grammar, "pq");

    run.set_case("allfix");
    run.case("p2 p1 a", None);
    run.case("p1 p2 a", Some("l10{ p1 l9{ p2 a } }"));
    run.case("a q1 q2", None);
    run.case("a q2 q1", Some("l8{ l7{ a q2 } q1 }"));
    run.case("p3 aaa x1 bbb q3", Some("l6{ l4{ p3 aaa } x1 l2{ bbb q3 } }"));
    run.case("aaa q3 x1 bbb q2", Some("l7{ l6{ l2{ aaa q3 } x1 bbb } q2 }"));
    run.case("aaa q2 x1 bbb q3", None);
}

fn ternary_ltr(run: &mut TestRun) {
    let grammar = GrammarBuilder::new()
        .level_ltr("ter", vec![Op::ternary("?", ":")])
        .finish()
        .expect("ternary grammar is well formed");
    run.set_grammar(grammar, "ternary");

    run.set_case("easy");
    run.case("a ? b : c", Some("ter{ a ? b : c }"));
    run.case("a ? b : c ? d : e", Some("ter{ ter{ a ? b : c } ? d : e }"));
    run.case("a ? b ? c : d : e", Some("ter{ a ? ter{ b ? c : d } : e }"));
}

fn parentheses(run: &mut TestRun) {
    // A bracketed operator may not reuse a spelling that is already a
    // right bracket, nor collide with the transparent pair.
    run.expect_grammar_error(
        GrammarBuilder::with_brackets("(..", "..)")
            .level_ltr("ter", vec![Op::ternary("(", ")")])
            .level_ltr("pst", vec![Op::postfix_bracketed("(", ")")])
            .finish(),
        "a ternary and a postfix bracket sharing `( )`",
    );
    run.expect_grammar_error(
        GrammarBuilder::new()
            .level_rtl("prf", vec![Op::prefix_bracketed("(", ")")])
            .finish(),
        "a prefix bracket colliding with the transparent pair",
    );

    let parens = GrammarBuilder::with_brackets("(..", "..)")
        .level_rtl("prf", vec![Op::prefix_bracketed("(", ")")])
        .finish()
        .expect("parens grammar is well formed");
    run.set_grammar(parens, "parens");

    run.set_case("easy");
    run.case("( b ) a", Some("prf{ ( b ) a }"));
    run.case("a (.. b ..)", None);
    run.case("( (.. b ..) ) (.. a ..)", Some("prf{ ( b ) a }"));

    let parens_concat = GrammarBuilder::with_brackets("(..", "..)")
        .level_rtl("prf", vec![Op::prefix_bracketed("(", ")")])
        .level_ltr("cat", vec![Op::concat()])
        .finish()
        .expect("parens-concat grammar is well formed");
    run.set_grammar(parens_concat, "parens-concat");

    run.set_case("easy");
    run.case("( b ) a", Some("prf{ ( b ) a }"));
    run.case("a ( b ) c", Some("cat{ a CONCAT prf{ ( b ) c } }"));
    run.case("( b ) a c", Some("cat{ prf{ ( b ) a } CONCAT c }"));
    run.case("f a ( b ) c", Some("cat{ cat{ f CONCAT a } CONCAT prf{ ( b ) c } }"));
    run.case("f ( b ) a c", Some("cat{ cat{ f CONCAT prf{ ( b ) a } } CONCAT c }"));
    run.case("a b", Some("cat{ a CONCAT b }"));
    run.case("a (.. b ..)", Some("cat{ a CONCAT b }"));
    run.case(
        "( (.. b ..) ) (.. a ..) (.. c ..)",
        Some("cat{ prf{ ( b ) a } CONCAT c }"),
    );

    // Same operators with concatenation binding tighter than the bracket.
    let parens_concat_2 = GrammarBuilder::with_brackets("(..", "..)")
        .level_ltr("cat", vec![Op::concat()])
        .level_rtl("prf", vec![Op::prefix_bracketed("(", ")")])
        .finish()
        .expect("parens-concat-2 grammar is well formed");
    run.set_grammar(parens_concat_2, "parens-concat-2");

    run.set_case("easy");
    run.case("( b ) a", Some("prf{ ( b ) a }"));
    run.case("a ( b ) c", None);
    run.case("a (.. ( b ) c ..)", Some("cat{ a CONCAT prf{ ( b ) c } }"));
    run.case("( b ) a c", Some("prf{ ( b ) cat{ a CONCAT c } }"));
    run.case("f a ( b ) c", None);
    run.case("f ( b ) a c", None);
    run.case(
        "f a (.. ( b ) c ..)",
        Some("cat{ cat{ f CONCAT a } CONCAT prf{ ( b ) c } }"),
    );
    run.case(
        "f (.. ( b ) a ..) c",
        Some("cat{ cat{ f CONCAT prf{ ( b ) a } } CONCAT c }"),
    );
    run.case("a b", Some("cat{ a CONCAT b }"));
    run.case("a (.. b ..)", Some("cat{ a CONCAT b }"));
    run.case(
        "( (.. b ..) ) (.. a ..) (.. c ..)",
        Some("prf{ ( b ) cat{ a CONCAT c } }"),
    );
}

fn concat(run: &mut TestRun) {
    let grammar = GrammarBuilder::new()
        .level_rtl("fnc", vec![Op::infix(".")])
        .level_ltr("exc", vec![Op::postfix("!")])
        .level_rtl("tld", vec![Op::prefix("~")])
        .level_ltr("add", vec![Op::infix("+")])
        .level_ltr("ifx", vec![Op::concat(), Op::infix("*")])
        .level_ltr("qus", vec![Op::postfix("?")])
        .level_rtl("prf", vec![Op::prefix("-")])
        .level_rtl("eqa", vec![Op::infix("=")])
        .finish()
        .expect("concat grammar is well formed");
    run.set_grammar(grammar, "concat");

    run.set_case("easy");
    run.case("a b", Some("ifx{ a CONCAT b }"));
    run.case("a b c", Some("ifx{ ifx{ a CONCAT b } CONCAT c }"));
    run.case("a b * c d", Some("ifx{ ifx{ ifx{ a CONCAT b } * c } CONCAT d }"));
    run.case("a b . c d", Some("ifx{ ifx{ a CONCAT fnc{ b . c } } CONCAT d }"));
    run.case("a b = c d", Some("eqa{ ifx{ a CONCAT b } = ifx{ c CONCAT d } }"));
    run.case("~ a b", Some("ifx{ tld{ ~ a } CONCAT b }"));
    run.case("- a b", Some("prf{ - ifx{ a CONCAT b } }"));
    run.case("a b !", Some("ifx{ a CONCAT exc{ b ! } }"));
    run.case("a b ?", Some("qus{ ifx{ a CONCAT b } ? }"));
    run.case("a ~ b", Some("ifx{ a CONCAT tld{ ~ b } }"));
    run.case("a - b", None);
    run.case("a ! b", Some("ifx{ exc{ a ! } CONCAT b }"));
    run.case("a ? b", None);

    let grammar_rtl = GrammarBuilder::new()
        .level_rtl("fnc", vec![Op::infix(".")])
        .level_ltr("exc", vec![Op::postfix("!")])
        .level_rtl("tld", vec![Op::prefix("~")])
        .level_ltr("add", vec![Op::infix("+"), Op::infix("-")])
        .level_rtl("ifx", vec![Op::concat(), Op::infix("*")])
        .level_ltr("qus", vec![Op::postfix("?")])
        .level_rtl("prf", vec![Op::prefix("-")])
        .level_rtl("eqa", vec![Op::infix("=")])
        .finish()
        .expect("concat-rtl grammar is well formed");
    run.set_grammar(grammar_rtl, "concat-rtl");

    run.set_case("easy");
    run.case("a b", Some("ifx{ a CONCAT b }"));
    run.case("a - b", Some("add{ a - b }"));
    run.case("a ( - b )", Some("ifx{ a CONCAT prf{ - b } }"));
    run.case("a b c", Some("ifx{ a CONCAT ifx{ b CONCAT c } }"));
}

/// The C++ expression grammar from the operator-precedence table
pub fn cpp_grammar() -> Grammar {
    GrammarBuilder::new()
        .level_ltr("nam", vec![Op::infix("::")])
        .level_ltr(
            "pst",
            vec![
                Op::postfix("++"),
                Op::postfix("--"),
                Op::postfix_bracketed("(", ")"),
                Op::postfix_bracketed("[", "]"),
                Op::infix("."),
                Op::infix("->"),
            ],
        )
        .level_rtl(
            "prf",
            vec![
                Op::prefix("++"),
                Op::prefix("--"),
                Op::prefix_bracketed("<.", ".>"),
                Op::prefix("+"),
                Op::prefix("-"),
                Op::prefix("!"),
                Op::prefix("~"),
                Op::prefix("*"),
                Op::prefix("&"),
                Op::prefix("sizeof"),
                Op::prefix("new"),
            ],
        )
        .level_ltr("mem", vec![Op::infix(".*"), Op::infix("->*")])
        .level_ltr("mul", vec![Op::infix("*"), Op::infix("/"), Op::infix("%")])
        .level_ltr("add", vec![Op::infix("+"), Op::infix("-")])
        .level_ltr("sft", vec![Op::infix("<<"), Op::infix(">>")])
        .level_ltr("spc", vec![Op::infix("<=>")])
        .level_ltr(
            "cmp",
            vec![Op::infix("<"), Op::infix("<="), Op::infix(">"), Op::infix(">=")],
        )
        .level_ltr("eqa", vec![Op::infix("=="), Op::infix("!=")])
        .level_ltr("ban", vec![Op::infix("&")])
        .level_ltr("xor", vec![Op::infix("^")])
        .level_ltr("bor", vec![Op::infix("|")])
        .level_ltr("lan", vec![Op::infix("&&")])
        .level_ltr("lor", vec![Op::infix("||")])
        .level_rtl(
            "asg",
            vec![
                Op::ternary("?", ":"),
                Op::prefix("throw"),
                Op::infix("="),
                Op::infix("+="),
                Op::infix("-="),
            ],
        )
        .level_ltr("com", vec![Op::infix(",")])
        .finish()
        .expect("cpp grammar is well formed")
}

fn cpp(run: &mut TestRun) {
    run.set_grammar(cpp_grammar(), "cpp");

    run.set_case("basic");
    run.case("++ a", Some("prf{ ++ a }"));
    run.case("a --", Some("pst{ a -- }"));
    run.case("++ a --", Some("prf{ ++ pst{ a -- } }"));
    run.case("-- a ++", Some("prf{ -- pst{ a ++ } }"));
    run.case("a ( b , c )", Some("pst{ a ( com{ b , c } ) }"));
    run.case("a ( b , c , d )", Some("pst{ a ( com{ com{ b , c } , d } ) }"));
    run.case("a + ( b , c , d )", Some("add{ a + com{ com{ b , c } , d } }"));
    run.case("a ( ( b , c ) )", Some("pst{ a ( com{ b , c } ) }"));
    run.case("sizeof a", Some("prf{ sizeof a }"));
    run.case("sizeof ( a )", Some("prf{ sizeof a }"));
    run.case("a + ( b + c )", Some("add{ a + add{ b + c } }"));
    run.case("a ( b + c )", Some("pst{ a ( add{ b + c } ) }"));
    run.case("( int ) a", None);
    run.case("int a", None);
    run.case("a < b", Some("cmp{ a < b }"));
    run.case("a > b", Some("cmp{ a > b }"));
    run.case("<. int .> a", Some("prf{ <. int .> a }"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{reference, shunting_yard};

    #[test]
    fn test_corpus_runs_against_both_parsers() {
        let count = execute(shunting_yard::parse).expect("shunting yard corpus");
        assert_eq!(count, execute(reference::parse).expect("reference corpus"));
    }

    #[test]
    fn test_divergence_is_reported() {
        // A deliberately wrong "parser" must fail the corpus.
        fn broken(_: &Grammar, _: &[Token]) -> Result<Node, ParseError> {
            Ok(Node::leaf("nope"))
        }
        assert!(execute(broken).is_err());
    }
}
