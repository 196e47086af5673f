//! Tree-walking evaluator for parsed query scripts.
//!
//! Only the store handle passed in is reachable; identifiers resolve to local
//! bindings first, then to the allow-listed builtins.

use std::collections::HashMap;

use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;

use crate::core::store::document::{Document, FieldMap, FieldValue};
use crate::core::store::document_store_trait::DocumentStore;
use crate::domain::query::model::query_result::{QueryOutcome, ROW_ID_FIELD};
use crate::domain::query::script::ast::{
    ArrayItem, Expr, Literal, ObjectItem, Program, Statement, TemplatePart,
};
use crate::domain::query::script::builtins::{self, GLOBAL_FUNCTIONS, NAMESPACES};
use crate::domain::query::script::script_error::ScriptError;
use crate::domain::query::script::value::{QuerySnapshot, ScriptValue};

enum Flow {
    Normal,
    Return(ScriptValue),
}

type Scope = HashMap<String, ScriptValue>;

pub struct Interpreter<'a> {
    store: &'a dyn DocumentStore,
    scopes: Vec<Scope>,
    logs: Vec<String>,
}

impl<'a> Interpreter<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            scopes: vec![Scope::new()],
            logs: Vec::new(),
        }
    }

    /// Runs the program to completion and returns the value of its `return`,
    /// or `undefined` when it never returns.
    pub async fn run(&mut self, program: &Program) -> Result<ScriptValue, ScriptError> {
        match self.exec_statements(&program.statements).await? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(ScriptValue::Undefined),
        }
    }

    /// Console lines captured so far, in call order.
    pub fn into_logs(self) -> Vec<String> {
        self.logs
    }

    fn is_bound(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains_key(name))
    }

    fn lookup(&self, name: &str) -> Result<ScriptValue, ScriptError> {
        if let Some(value) = self.scopes.iter().rev().find_map(|scope| scope.get(name)) {
            return Ok(value.clone());
        }
        match name {
            "db" => Ok(ScriptValue::Database),
            builtin if GLOBAL_FUNCTIONS.contains(&builtin) || NAMESPACES.contains(&builtin) => {
                Err(ScriptError::Type(format!("{builtin} can only be called")))
            }
            unknown => Err(ScriptError::NotDefined(unknown.to_string())),
        }
    }

    fn declare(&mut self, name: &str, value: ScriptValue) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    fn exec_statements<'s>(
        &'s mut self,
        statements: &'s [Statement],
    ) -> BoxFuture<'s, Result<Flow, ScriptError>> {
        async move {
            for statement in statements {
                if let Flow::Return(value) = self.exec_statement(statement).await? {
                    return Ok(Flow::Return(value));
                }
            }
            Ok(Flow::Normal)
        }
        .boxed()
    }

    /// Runs `statements` in a fresh scope seeded with `bindings`.
    async fn exec_scoped(
        &mut self,
        statements: &[Statement],
        bindings: Scope,
    ) -> Result<Flow, ScriptError> {
        self.scopes.push(bindings);
        let flow = self.exec_statements(statements).await;
        self.scopes.pop();
        flow
    }

    async fn exec_statement(&mut self, statement: &Statement) -> Result<Flow, ScriptError> {
        match statement {
            Statement::Declare { name, value } => {
                let value = self.eval(value).await?;
                self.declare(name, value);
            }
            Statement::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr).await?,
                    None => ScriptValue::Undefined,
                };
                return Ok(Flow::Return(value));
            }
            Statement::If {
                condition,
                then,
                otherwise,
            } => {
                let branch = if self.eval(condition).await?.is_truthy() {
                    then
                } else {
                    otherwise
                };
                return self.exec_scoped(branch, Scope::new()).await;
            }
            Statement::ForOf {
                binding,
                iterable,
                body,
            } => {
                let items = match self.eval(iterable).await? {
                    ScriptValue::Array(items) => items,
                    ScriptValue::String(s) => {
                        s.chars().map(|c| ScriptValue::String(c.to_string())).collect()
                    }
                    other => {
                        return Err(ScriptError::Type(format!(
                            "{} is not iterable",
                            other.type_name()
                        )))
                    }
                };
                for item in items {
                    let bindings = Scope::from([(binding.clone(), item)]);
                    if let Flow::Return(value) = self.exec_scoped(body, bindings).await? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            Statement::Try {
                body,
                binding,
                handler,
            } => {
                return match self.exec_scoped(body, Scope::new()).await {
                    Ok(flow) => Ok(flow),
                    Err(err) => {
                        let mut bindings = Scope::new();
                        if let Some(name) = binding {
                            bindings.insert(name.clone(), caught_value(&err));
                        }
                        self.exec_scoped(handler, bindings).await
                    }
                };
            }
            Statement::Throw(value) => {
                let value = self.eval(value).await?;
                return Err(ScriptError::Thrown(builtins::thrown_message(&value)));
            }
            Statement::Expr(expr) => {
                self.eval(expr).await?;
            }
        }
        Ok(Flow::Normal)
    }

    fn eval<'s>(&'s mut self, expr: &'s Expr) -> BoxFuture<'s, Result<ScriptValue, ScriptError>> {
        async move {
            match expr {
                Expr::Literal(literal) => Ok(literal_value(literal)),
                Expr::Template(parts) => {
                    let mut text = String::new();
                    for part in parts {
                        match part {
                            TemplatePart::Text(chunk) => text.push_str(chunk),
                            TemplatePart::Expr(inner) => {
                                text.push_str(&self.eval(inner).await?.display())
                            }
                        }
                    }
                    Ok(ScriptValue::String(text))
                }
                Expr::Ident(name) => self.lookup(name),
                Expr::Array(items) => {
                    let mut values = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            ArrayItem::Item(inner) => values.push(self.eval(inner).await?),
                            ArrayItem::Spread(inner) => match self.eval(inner).await? {
                                ScriptValue::Array(spread) => values.extend(spread),
                                other => {
                                    return Err(ScriptError::Type(format!(
                                        "{} is not iterable",
                                        other.type_name()
                                    )))
                                }
                            },
                        }
                    }
                    Ok(ScriptValue::Array(values))
                }
                Expr::Object(items) => {
                    let mut map = IndexMap::new();
                    for item in items {
                        match item {
                            ObjectItem::Field(key, inner) => {
                                let value = self.eval(inner).await?;
                                map.insert(key.clone(), value);
                            }
                            ObjectItem::Spread(inner) => {
                                let value = self.eval(inner).await?;
                                spread_into(&mut map, value);
                            }
                        }
                    }
                    Ok(ScriptValue::Object(map))
                }
                Expr::Member { target, property } => {
                    let target = self.eval(target).await?;
                    builtins::member(&target, property)
                }
                Expr::Index { target, index } => {
                    let target = self.eval(target).await?;
                    let index = self.eval(index).await?;
                    builtins::index(&target, &index)
                }
                Expr::Call { callee, args } => self.call(callee, args).await,
                Expr::New { class, args } => {
                    let args = self.eval_args(args).await?;
                    builtins::construct(class, args)
                }
                // every store call already completes before returning
                Expr::Await(inner) => self.eval(inner).await,
                Expr::Not(inner) => Ok(ScriptValue::Bool(!self.eval(inner).await?.is_truthy())),
            }
        }
        .boxed()
    }

    async fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<ScriptValue>, ScriptError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg).await?);
        }
        Ok(values)
    }

    async fn call(&mut self, callee: &Expr, args: &[Expr]) -> Result<ScriptValue, ScriptError> {
        match callee {
            Expr::Ident(name) if !self.is_bound(name) => {
                let args = self.eval_args(args).await?;
                self.call_global(name, args).await
            }
            Expr::Ident(name) => Err(ScriptError::Type(format!("{name} is not a function"))),
            Expr::Member { target, property } => {
                if let Expr::Ident(name) = target.as_ref() {
                    if !self.is_bound(name) && NAMESPACES.contains(&name.as_str()) {
                        let args = self.eval_args(args).await?;
                        return self.call_static(name, property, &args);
                    }
                    if self.is_bound(name) && matches!(property.as_str(), "push" | "setHours") {
                        let args = self.eval_args(args).await?;
                        return self.call_mutating(name, property, args);
                    }
                }
                let receiver = self.eval(target).await?;
                let args = self.eval_args(args).await?;
                builtins::call_method(&receiver, property, &args)
            }
            other => {
                let value = self.eval(other).await?;
                Err(ScriptError::Type(format!(
                    "{} is not a function",
                    value.type_name()
                )))
            }
        }
    }

    async fn call_global(
        &mut self,
        name: &str,
        args: Vec<ScriptValue>,
    ) -> Result<ScriptValue, ScriptError> {
        match name {
            "collection" => builtins::collection(&args),
            "doc" => builtins::doc(&args),
            "query" => builtins::query(args),
            "where" => builtins::where_filter(&args),
            "orderBy" => builtins::order_by(&args),
            "limit" => builtins::limit(&args),
            "limitToLast" => builtins::limit_to_last(&args),
            "startAt" | "startAfter" | "endAt" | "endBefore" => builtins::cursor(name, &args),
            "documentId" => Ok(builtins::document_id()),
            "getDocs" => {
                let target = builtins::query_target(first_arg(args))?;
                let docs = self
                    .store
                    .get_all(&target.collection, &target.constraints)
                    .await?;
                Ok(ScriptValue::QuerySnapshot(QuerySnapshot {
                    collection: target.collection,
                    docs,
                }))
            }
            "getDoc" => {
                let reference = builtins::document_target(first_arg(args))?;
                let document = self.store.get_one(&reference).await?;
                Ok(ScriptValue::document_snapshot(reference, document))
            }
            "db" => Err(ScriptError::Type("db is not a function".to_string())),
            unknown => Err(ScriptError::NotDefined(unknown.to_string())),
        }
    }

    fn call_static(
        &mut self,
        namespace: &str,
        method: &str,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, ScriptError> {
        match namespace {
            "console" => {
                let line = builtins::console_line(method, args)?;
                self.logs.push(line);
                Ok(ScriptValue::Undefined)
            }
            "Timestamp" if method == "now" => {
                Ok(ScriptValue::Timestamp(self.store.make_timestamp(None)))
            }
            "Timestamp" => builtins::timestamp_static(method, args).map(ScriptValue::Timestamp),
            "Date" => builtins::date_static(method),
            other => Err(ScriptError::NotDefined(other.to_string())),
        }
    }

    /// Methods that update a bound variable in place.
    fn call_mutating(
        &mut self,
        name: &str,
        method: &str,
        args: Vec<ScriptValue>,
    ) -> Result<ScriptValue, ScriptError> {
        let slot = self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
            .ok_or_else(|| ScriptError::NotDefined(name.to_string()))?;

        match (method, slot) {
            ("push", ScriptValue::Array(items)) => {
                items.extend(args);
                Ok(ScriptValue::Number(items.len() as f64))
            }
            ("setHours", ScriptValue::Date(date)) => {
                *date = builtins::set_hours(*date, &args)?;
                Ok(ScriptValue::Number(date.timestamp_millis() as f64))
            }
            (_, other) => Err(ScriptError::Type(format!(
                "{name}.{method} is not a function ({})",
                other.type_name()
            ))),
        }
    }
}

fn first_arg(args: Vec<ScriptValue>) -> ScriptValue {
    args.into_iter().next().unwrap_or(ScriptValue::Undefined)
}

fn literal_value(literal: &Literal) -> ScriptValue {
    match literal {
        Literal::Undefined => ScriptValue::Undefined,
        Literal::Null => ScriptValue::Null,
        Literal::Bool(b) => ScriptValue::Bool(*b),
        Literal::Number(n) => ScriptValue::Number(*n),
        Literal::String(s) => ScriptValue::String(s.clone()),
    }
}

/// `{...value}`: objects copy their fields, arrays their indices, anything else adds nothing.
fn spread_into(map: &mut IndexMap<String, ScriptValue>, value: ScriptValue) {
    match value {
        ScriptValue::Object(fields) => map.extend(fields),
        ScriptValue::Array(items) => {
            map.extend(items.into_iter().enumerate().map(|(i, v)| (i.to_string(), v)))
        }
        _ => {}
    }
}

fn caught_value(err: &ScriptError) -> ScriptValue {
    let message = match err {
        ScriptError::Thrown(message) => message.clone(),
        other => other.to_string(),
    };
    builtins::error_object(message)
}

fn item_field(value: &ScriptValue) -> Result<FieldValue, ScriptError> {
    match value {
        // `return snap.docs` keeps each document's id
        ScriptValue::DocumentSnapshot(snap) => Ok(match &snap.document {
            Some(document) => {
                let mut fields = FieldMap::with_capacity(document.fields.len() + 1);
                fields.insert(ROW_ID_FIELD.to_string(), FieldValue::String(document.id.clone()));
                fields.extend(document.fields.clone());
                FieldValue::Map(fields)
            }
            None => FieldValue::Null,
        }),
        other => other.to_field(),
    }
}

/// Classifies the value a script returned.
pub fn classify_outcome(value: ScriptValue) -> Result<QueryOutcome, ScriptError> {
    let outcome = match value {
        ScriptValue::QuerySnapshot(snap) => QueryOutcome::DocumentList {
            collection: snap.collection.path(),
            documents: snap.docs,
        },
        ScriptValue::DocumentSnapshot(snap) => match snap.document {
            Some(document) => QueryOutcome::SingleDocument {
                collection: snap.reference.collection().path(),
                document,
            },
            None => QueryOutcome::Empty,
        },
        ScriptValue::Array(items) => QueryOutcome::RawArray(
            items.iter().map(item_field).collect::<Result<Vec<_>, _>>()?,
        ),
        ScriptValue::Object(map) => {
            let fields = match ScriptValue::Object(map).to_field()? {
                FieldValue::Map(fields) => fields,
                _ => FieldMap::new(),
            };
            let document_id = match fields.get("id") {
                Some(FieldValue::String(id)) if !fields.contains_key(ROW_ID_FIELD) => Some(id.clone()),
                _ => None,
            };
            match document_id {
                Some(id) => QueryOutcome::SingleDocument {
                    collection: "document".to_string(),
                    document: Document::new(id, fields),
                },
                None => QueryOutcome::RawObject(fields),
            }
        }
        _ => QueryOutcome::Empty,
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::memory_store::InMemoryDocumentStore;
    use crate::core::store::reference::CollectionRef;
    use crate::domain::query::script::parser::parse_program;
    use serde_json::json;

    fn seeded_store() -> InMemoryDocumentStore {
        let store = InMemoryDocumentStore::new();
        let users = CollectionRef::new("users").unwrap();
        for (id, body) in [
            ("a", json!({ "name": "Ann", "age": 31, "roles": { "admin": true } })),
            ("b", json!({ "name": "Ben", "age": 17 })),
            ("c", json!({ "name": "Cat", "age": 24 })),
        ] {
            let FieldValue::Map(fields) = FieldValue::from(body) else {
                panic!("fixture must be an object");
            };
            store.insert(&users, id, fields).unwrap();
        }
        let program = CollectionRef::new("users/a/mentorProgram").unwrap();
        let FieldValue::Map(fields) = FieldValue::from(json!({ "track": "design" })) else {
            panic!("fixture must be an object");
        };
        store.insert(&program, "profile", fields).unwrap();
        store
    }

    async fn run(store: &InMemoryDocumentStore, source: &str) -> (Result<ScriptValue, ScriptError>, Vec<String>) {
        let program = parse_program(source).unwrap();
        let mut interpreter = Interpreter::new(store);
        let result = interpreter.run(&program).await;
        (result, interpreter.into_logs())
    }

    #[tokio::test]
    async fn runs_filtered_query() {
        let store = seeded_store();
        let (result, logs) = run(
            &store,
            r#"
            const snapshot = await getDocs(query(
                collection(db, 'users'),
                where('age', '>=', 18),
                orderBy('age', 'desc'),
            ));
            console.log('Total users:', snapshot.size);
            return snapshot;
            "#,
        )
        .await;

        assert_eq!(logs, vec!["Total users: 2".to_string()]);
        let outcome = classify_outcome(result.unwrap()).unwrap();
        let QueryOutcome::DocumentList { collection, documents } = outcome else {
            panic!("expected document list");
        };
        assert_eq!(collection, "users");
        let ids: Vec<&str> = documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn collates_nested_documents() {
        let store = seeded_store();
        let (result, logs) = run(
            &store,
            r#"
            const profiles = [];
            const users = await getDocs(collection(db, 'users'));
            for (const user of users.docs) {
                try {
                    const profile = await getDoc(doc(db, 'users', user.id, 'mentorProgram', 'profile'));
                    if (profile.exists()) {
                        profiles.push({ ...profile.data(), _userId: user.id, _path: profile.ref.path });
                    }
                } catch (err) {
                    console.warn(err.message);
                }
            }
            console.log(`Found ${profiles.length} mentor profiles`);
            return profiles;
            "#,
        )
        .await;

        assert_eq!(logs, vec!["Found 1 mentor profiles".to_string()]);
        let QueryOutcome::RawArray(items) = classify_outcome(result.unwrap()).unwrap() else {
            panic!("expected raw array");
        };
        assert_eq!(
            items,
            vec![FieldValue::from(json!({
                "track": "design",
                "_userId": "a",
                "_path": "users/a/mentorProgram/profile",
            }))]
        );
    }

    #[tokio::test]
    async fn single_document_shapes() {
        let store = seeded_store();
        let (result, _) = run(&store, "return await getDoc(doc(db, 'users', 'b'))").await;
        let QueryOutcome::SingleDocument { collection, document } = classify_outcome(result.unwrap()).unwrap() else {
            panic!("expected single document");
        };
        assert_eq!((collection.as_str(), document.id.as_str()), ("users", "b"));

        let (result, _) = run(
            &store,
            "const s = await getDoc(doc(db, 'users', 'a')); return { id: s.id, ...s.data() }",
        )
        .await;
        let QueryOutcome::SingleDocument { collection, document } = classify_outcome(result.unwrap()).unwrap() else {
            panic!("expected single document");
        };
        assert_eq!(collection, "document");
        assert_eq!(document.fields.get("name"), Some(&FieldValue::from("Ann")));

        let (result, _) = run(&store, "return await getDoc(doc(db, 'users', 'zz'))").await;
        assert_eq!(classify_outcome(result.unwrap()).unwrap(), QueryOutcome::Empty);
    }

    #[tokio::test]
    async fn errors_surface_and_can_be_caught() {
        let store = seeded_store();
        let (result, _) = run(&store, "return fetch('http://example.com')").await;
        assert_eq!(result.unwrap_err(), ScriptError::NotDefined("fetch".into()));

        let (result, _) = run(&store, "const s = undefined; return s.docs").await;
        assert!(matches!(result, Err(ScriptError::Type(_))));

        let (result, logs) = run(
            &store,
            "try { throw new Error('boom') } catch (e) { console.error(e.message) } return 1",
        )
        .await;
        assert_eq!(result.unwrap(), ScriptValue::Number(1.0));
        assert_eq!(logs, vec!["ERROR: boom".to_string()]);

        let (result, _) = run(&store, "throw new Error('Document not found')").await;
        assert_eq!(result.unwrap_err().to_string(), "Document not found");
    }

    #[tokio::test]
    async fn plain_values_classify() {
        let store = seeded_store();
        let (result, _) = run(&store, "return { total: 3, label: 'x' }").await;
        assert!(matches!(classify_outcome(result.unwrap()).unwrap(), QueryOutcome::RawObject(_)));

        let (result, _) = run(&store, "const n = 5").await;
        assert_eq!(classify_outcome(result.unwrap()).unwrap(), QueryOutcome::Empty);

        let (result, _) = run(&store, "return (await getDocs(collection(db, 'users'))).docs.slice(0, 1)").await;
        let QueryOutcome::RawArray(items) = classify_outcome(result.unwrap()).unwrap() else {
            panic!("expected raw array");
        };
        let FieldValue::Map(first) = &items[0] else {
            panic!("expected map item");
        };
        assert_eq!(first.get(ROW_ID_FIELD), Some(&FieldValue::from("a")));
    }

    #[tokio::test]
    async fn block_scopes_do_not_leak() {
        let store = seeded_store();
        let (result, _) = run(&store, "if (true) { const inner = 1 } return inner").await;
        assert_eq!(result.unwrap_err(), ScriptError::NotDefined("inner".into()));
    }
}
