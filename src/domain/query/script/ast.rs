//! Syntax tree of the read-only query language.

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayItem {
    Item(Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectItem {
    Field(String, Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Template(Vec<TemplatePart>),
    Ident(String),
    Array(Vec<ArrayItem>),
    Object(Vec<ObjectItem>),
    Member { target: Box<Expr>, property: String },
    Index { target: Box<Expr>, index: Box<Expr> },
    Call { callee: Box<Expr>, args: Vec<Expr> },
    New { class: String, args: Vec<Expr> },
    Await(Box<Expr>),
    Not(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `const`/`let`/`var` binding.
    Declare { name: String, value: Expr },
    Return(Option<Expr>),
    If {
        condition: Expr,
        then: Vec<Statement>,
        otherwise: Vec<Statement>,
    },
    /// `for (const binding of iterable) { ... }`
    ForOf {
        binding: String,
        iterable: Expr,
        body: Vec<Statement>,
    },
    Try {
        body: Vec<Statement>,
        binding: Option<String>,
        handler: Vec<Statement>,
    },
    Throw(Expr),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}
