//! Constructor dependency injection for the first class of a file.
//!
//! The injector never edits the stream itself. It inspects the class body
//! with a bracket-skipping scan (method bodies, parameter lists and
//! attributes are jumped over) and returns the insertions that add a
//! property, a constructor parameter and an assignment per requirement.

use std::collections::BTreeSet;

use ferry_core::{EditSet, TokenEdit, TokenSpan};
use ferry_syntax::{lex_php_fragment, Token, TokenKind, TokenStream};
use thiserror::Error;

use crate::{DiRequirements, DiVariable};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectError {
    #[error("no class body found")]
    ClassBodyNotFound,
    #[error("class body opened at token {open} is never closed")]
    UnbalancedClassBody { open: usize },
    #[error("cannot extend constructor at tokens {span}: {reason}")]
    MalformedConstructor { span: TokenSpan, reason: &'static str },
}

impl InjectError {
    pub fn span(&self) -> Option<TokenSpan> {
        match self {
            InjectError::ClassBodyNotFound => None,
            InjectError::UnbalancedClassBody { open } => Some(TokenSpan::new(*open, open + 1)),
            InjectError::MalformedConstructor { span, .. } => Some(*span),
        }
    }
}

/// Produces the edits wiring a file's requirements into its class.
pub trait DependencyInjector: std::fmt::Debug + Send + Sync {
    fn inject(
        &self,
        stream: &TokenStream,
        requirements: &DiRequirements,
    ) -> Result<EditSet<Token>, InjectError>;
}

/// Index of the first `class` keyword that declares a named class.
///
/// `Foo::class` and `new class` are skipped.
pub fn class_declaration_keyword(stream: &TokenStream) -> Option<usize> {
    let mut from = 0;
    while let Some(idx) = stream.next_index_of_kind(from, TokenKind::ClassKw) {
        let named = stream
            .next_significant(idx + 1)
            .is_some_and(|next| stream.kind(next) == Some(TokenKind::Identifier));
        let prev = stream.prev_significant(idx).and_then(|prev| stream.kind(prev));
        if named && !matches!(prev, Some(TokenKind::DoubleColon | TokenKind::NewKw)) {
            return Some(idx);
        }
        from = idx + 1;
    }
    None
}

#[derive(Debug)]
struct ClassBody {
    body_open: usize,
    body_close: usize,
    extends: bool,
    indent: String,
}

#[derive(Debug)]
struct Constructor {
    function_kw: usize,
    params_open: usize,
    params_close: usize,
    body_open: usize,
    body_close: usize,
    indent: String,
}

#[derive(Debug)]
struct Param {
    first: usize,
    last: usize,
    name: Option<String>,
    optional: bool,
    variadic: bool,
    promoted: bool,
}

#[derive(Debug)]
struct ParamList {
    params: Vec<Param>,
    trailing_comma: Option<usize>,
    multiline: bool,
}

/// Adds constructor parameters, properties and assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorInjector {
    indent: String,
}

impl Default for ConstructorInjector {
    fn default() -> Self {
        Self::new("    ")
    }
}

impl ConstructorInjector {
    /// `indent` is one level of indentation in generated code.
    pub fn new(indent: impl Into<String>) -> Self {
        Self {
            indent: indent.into(),
        }
    }

    fn property_block(&self, member_indent: &str, variable: &DiVariable) -> String {
        let i = member_indent;
        format!(
            "\n{i}/**\n{i} * @var {ty}\n{i} */\n{i}protected ${name};\n",
            ty = variable.ty,
            name = variable.name,
        )
    }

    fn constructor_block(&self, member_indent: &str, requirements: &DiRequirements) -> String {
        let i = member_indent;
        let b = format!("{member_indent}{}", self.indent);
        let mut out = format!("\n{i}/**\n");
        for v in requirements {
            out.push_str(&format!("{i} * @param {} ${}\n", v.ty, v.name));
        }
        out.push_str(&format!("{i} */\n{i}public function __construct(\n"));
        let params: Vec<String> = requirements
            .iter()
            .map(|v| format!("{b}{} ${}", v.ty, v.name))
            .collect();
        out.push_str(&params.join(",\n"));
        out.push_str(&format!("\n{i}) {{\n"));
        for v in requirements {
            out.push_str(&format!("{b}$this->{name} = ${name};\n", name = v.name));
        }
        out.push_str(&format!("{i}}}\n"));
        out
    }

    fn extend_constructor(
        &self,
        stream: &TokenStream,
        ctor: &Constructor,
        list: &ParamList,
        requirements: &DiRequirements,
        edits: &mut EditSet<Token>,
    ) {
        let existing: BTreeSet<&str> = list
            .params
            .iter()
            .filter_map(|p| p.name.as_deref())
            .collect();
        let promoted: BTreeSet<&str> = list
            .params
            .iter()
            .filter(|p| p.promoted)
            .filter_map(|p| p.name.as_deref())
            .collect();
        let assigned = assigned_properties(stream, ctor);

        let new_params: Vec<String> = requirements
            .iter()
            .filter(|v| !existing.contains(v.name.as_str()))
            .map(|v| format!("{} ${}", v.ty, v.name))
            .collect();
        if !new_params.is_empty() {
            let (at, text) = self.parameter_insertion(stream, ctor, list, &new_params);
            edits.push(TokenEdit::insert(at, lex_php_fragment(&text)));
        }

        let new_assignments: Vec<&DiVariable> = requirements
            .iter()
            .filter(|v| !promoted.contains(v.name.as_str()) && !assigned.contains(&v.name))
            .collect();
        if new_assignments.is_empty() {
            return;
        }
        let body_indent = stream
            .next_significant(ctor.body_open + 1)
            .filter(|first| *first < ctor.body_close)
            .map(|first| line_indent(stream, first))
            .unwrap_or_else(|| format!("{}{}", ctor.indent, self.indent));

        let (at, text) = match parent_constructor_call(stream, ctor) {
            Some(parent) => {
                let text: String = new_assignments
                    .iter()
                    .map(|v| format!("$this->{name} = ${name};\n{body_indent}", name = v.name))
                    .collect();
                (parent, text)
            }
            None => {
                let mut anchor = ctor.body_close - 1;
                while anchor > ctor.body_open && stream.kind(anchor) == Some(TokenKind::Whitespace) {
                    anchor -= 1;
                }
                let mut text: String = new_assignments
                    .iter()
                    .map(|v| format!("\n{body_indent}$this->{name} = ${name};", name = v.name))
                    .collect();
                if ctor.body_close == ctor.body_open + 1 {
                    text.push('\n');
                    text.push_str(&ctor.indent);
                }
                (anchor + 1, text)
            }
        };
        edits.push(TokenEdit::insert(at, lex_php_fragment(&text)));
    }

    fn parameter_insertion(
        &self,
        stream: &TokenStream,
        ctor: &Constructor,
        list: &ParamList,
        new_params: &[String],
    ) -> (usize, String) {
        let param_indent = list
            .params
            .first()
            .filter(|_| list.multiline)
            .map(|p| line_indent(stream, p.first))
            .unwrap_or_else(|| format!("{}{}", ctor.indent, self.indent));
        let pi = param_indent.as_str();

        // New parameters are required; they go before the first optional or
        // variadic one.
        if let Some(boundary) = list.params.iter().find(|p| p.optional || p.variadic) {
            let text = new_params
                .iter()
                .map(|p| {
                    if list.multiline {
                        format!("{p},\n{pi}")
                    } else {
                        format!("{p}, ")
                    }
                })
                .collect();
            return (boundary.first, text);
        }

        match (list.params.last(), list.trailing_comma) {
            (Some(_), Some(comma)) => {
                let text = new_params
                    .iter()
                    .map(|p| {
                        if list.multiline {
                            format!("\n{pi}{p},")
                        } else {
                            format!(" {p},")
                        }
                    })
                    .collect();
                (comma + 1, text)
            }
            (Some(last), None) => {
                let text = new_params
                    .iter()
                    .map(|p| {
                        if list.multiline {
                            format!(",\n{pi}{p}")
                        } else {
                            format!(", {p}")
                        }
                    })
                    .collect();
                (last.last + 1, text)
            }
            (None, _) => {
                let text = if list.multiline {
                    format!("\n{pi}{}", new_params.join(&format!(",\n{pi}")))
                } else {
                    new_params.join(", ")
                };
                (ctor.params_open + 1, text)
            }
        }
    }
}

impl DependencyInjector for ConstructorInjector {
    fn inject(
        &self,
        stream: &TokenStream,
        requirements: &DiRequirements,
    ) -> Result<EditSet<Token>, InjectError> {
        let mut edits = EditSet::new();
        if requirements.is_empty() {
            return Ok(edits);
        }

        let class = locate_class(stream)?;
        let (mut declared, constructor) = scan_members(stream, &class)?;
        let member_indent = format!("{}{}", class.indent, self.indent);

        let list = match &constructor {
            Some(ctor) => {
                let list = parameter_list(stream, ctor);
                declared.extend(
                    list.params
                        .iter()
                        .filter(|p| p.promoted)
                        .filter_map(|p| p.name.clone()),
                );
                Some(list)
            }
            None => None,
        };

        let mut header = String::new();
        for variable in requirements {
            tracing::debug!(
                target: "ferry.migrate",
                name = %variable.name,
                ty = %variable.ty,
                "injecting constructor dependency"
            );
            if !declared.contains(&variable.name) {
                header.push_str(&self.property_block(&member_indent, variable));
            }
        }

        match (&constructor, &list) {
            (Some(ctor), Some(list)) => {
                tracing::debug!(
                    target: "ferry.migrate",
                    at = ctor.function_kw,
                    params = list.params.len(),
                    "extending existing constructor"
                );
                self.extend_constructor(stream, ctor, list, requirements, &mut edits)
            }
            _ => {
                if class.extends {
                    tracing::debug!(
                        target: "ferry.migrate",
                        "synthesized constructor does not call parent::__construct"
                    );
                }
                header.push_str(&self.constructor_block(&member_indent, requirements));
            }
        }

        if !header.is_empty() {
            edits.push(TokenEdit::insert(class.body_open + 1, lex_php_fragment(&header)));
        }
        Ok(edits)
    }
}

fn locate_class(stream: &TokenStream) -> Result<ClassBody, InjectError> {
    let keyword = class_declaration_keyword(stream).ok_or(InjectError::ClassBodyNotFound)?;
    let name = stream
        .next_significant(keyword + 1)
        .ok_or(InjectError::ClassBodyNotFound)?;

    let mut extends = false;
    let mut idx = name + 1;
    let body_open = loop {
        match stream.kind(idx) {
            Some(TokenKind::LBrace) => break idx,
            Some(TokenKind::ExtendsKw) => extends = true,
            Some(kind)
                if kind.is_trivia()
                    || kind.is_name()
                    || matches!(kind, TokenKind::ImplementsKw | TokenKind::Comma) => {}
            _ => return Err(InjectError::ClassBodyNotFound),
        }
        idx += 1;
    };
    let body_close = stream
        .matching_close(body_open)
        .ok_or(InjectError::UnbalancedClassBody { open: body_open })?;

    Ok(ClassBody {
        body_open,
        body_close,
        extends,
        indent: line_indent(stream, keyword),
    })
}

/// Property names declared at class depth and the constructor, if any.
fn scan_members(
    stream: &TokenStream,
    class: &ClassBody,
) -> Result<(BTreeSet<String>, Option<Constructor>), InjectError> {
    let unbalanced = InjectError::UnbalancedClassBody {
        open: class.body_open,
    };
    let mut declared = BTreeSet::new();
    let mut constructor = None;

    let mut idx = class.body_open + 1;
    while idx < class.body_close {
        let Some(kind) = stream.kind(idx) else {
            break;
        };
        match kind {
            TokenKind::Variable => {
                declared.insert(stream.text(idx).trim_start_matches('$').to_owned());
            }
            TokenKind::FunctionKw if constructor.is_none() => {
                if let Some(ctor) = constructor_at(stream, idx, class.body_close)? {
                    idx = ctor.body_close + 1;
                    constructor = Some(ctor);
                    continue;
                }
            }
            kind if kind.closing_bracket().is_some() => {
                idx = stream.matching_close(idx).ok_or_else(|| unbalanced.clone())? + 1;
                continue;
            }
            _ => {}
        }
        idx += 1;
    }
    Ok((declared, constructor))
}

fn constructor_at(
    stream: &TokenStream,
    function_kw: usize,
    limit: usize,
) -> Result<Option<Constructor>, InjectError> {
    let Some(mut name) = stream.next_significant(function_kw + 1) else {
        return Ok(None);
    };
    if stream.kind(name) == Some(TokenKind::Amp) {
        match stream.next_significant(name + 1) {
            Some(next) => name = next,
            None => return Ok(None),
        }
    }
    if !stream.get(name).is_some_and(|t| t.is_word("__construct")) {
        return Ok(None);
    }

    let malformed = |end: usize, reason: &'static str| InjectError::MalformedConstructor {
        span: TokenSpan::new(function_kw, end.max(function_kw)),
        reason,
    };

    let params_open = stream
        .next_significant(name + 1)
        .filter(|idx| stream.kind(*idx) == Some(TokenKind::LParen))
        .ok_or_else(|| malformed(name + 1, "missing parameter list"))?;
    let params_close = stream
        .matching_close(params_open)
        .ok_or_else(|| malformed(params_open + 1, "unbalanced parameter list"))?;

    // Skip an optional return type up to the body or the terminating `;`.
    let mut idx = params_close + 1;
    while idx < limit
        && !matches!(
            stream.kind(idx),
            Some(TokenKind::LBrace | TokenKind::Semicolon)
        )
    {
        idx += 1;
    }
    let body_open = match stream.kind(idx) {
        Some(TokenKind::LBrace) if idx < limit => idx,
        Some(TokenKind::Semicolon) if idx < limit => {
            return Err(malformed(idx + 1, "constructor has no body"))
        }
        _ => return Err(malformed(idx, "constructor has no body")),
    };
    let body_close = stream
        .matching_close(body_open)
        .ok_or_else(|| malformed(body_open + 1, "unbalanced constructor body"))?;

    Ok(Some(Constructor {
        function_kw,
        params_open,
        params_close,
        body_open,
        body_close,
        indent: line_indent(stream, function_kw),
    }))
}

fn parameter_list(stream: &TokenStream, ctor: &Constructor) -> ParamList {
    let mut params = Vec::new();
    let mut trailing_comma = None;
    let mut segment_start = ctor.params_open + 1;
    let mut idx = segment_start;
    while idx <= ctor.params_close {
        let kind = stream.kind(idx);
        if idx == ctor.params_close || kind == Some(TokenKind::Comma) {
            match parameter(stream, segment_start, idx) {
                Some(param) => params.push(param),
                None if idx == ctor.params_close => {
                    trailing_comma = (segment_start > ctor.params_open + 1).then(|| segment_start - 1);
                }
                None => {}
            }
            segment_start = idx + 1;
            idx += 1;
            continue;
        }
        if kind.is_some_and(|k| k.closing_bracket().is_some()) {
            idx = stream.matching_close(idx).map_or(ctor.params_close, |close| close + 1);
            continue;
        }
        idx += 1;
    }

    ParamList {
        params,
        trailing_comma,
        multiline: stream
            .text_of(ctor.params_open, ctor.params_close)
            .contains('\n'),
    }
}

/// One parameter in `[start, end)`; `None` for an empty segment.
fn parameter(stream: &TokenStream, start: usize, end: usize) -> Option<Param> {
    let first = stream.next_significant(start).filter(|idx| *idx < end)?;
    let last = stream.prev_significant(end).filter(|idx| *idx >= first)?;

    let mut name = None;
    let mut optional = false;
    let mut variadic = false;
    let mut promoted = false;
    let mut idx = first;
    while idx <= last {
        let Some(kind) = stream.kind(idx) else {
            break;
        };
        match kind {
            TokenKind::Variable if name.is_none() && !optional => {
                name = Some(stream.text(idx).trim_start_matches('$').to_owned());
            }
            TokenKind::Eq => optional = true,
            TokenKind::Ellipsis => variadic = true,
            kind if kind.is_modifier() => promoted = true,
            kind if kind.closing_bracket().is_some() => {
                idx = stream.matching_close(idx).map_or(last + 1, |close| close + 1);
                continue;
            }
            _ => {}
        }
        idx += 1;
    }

    Some(Param {
        first,
        last,
        name,
        optional,
        variadic,
        promoted,
    })
}

/// Names assigned through `$this->name =` anywhere in the constructor body.
fn assigned_properties(stream: &TokenStream, ctor: &Constructor) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for idx in ctor.body_open + 1..ctor.body_close {
        let is_this = stream.kind(idx) == Some(TokenKind::Variable) && stream.text(idx) == "$this";
        if !is_this {
            continue;
        }
        let assigned = (|| {
            let arrow = stream
                .next_significant(idx + 1)
                .filter(|i| stream.kind(*i) == Some(TokenKind::Arrow))?;
            let name = stream
                .next_significant(arrow + 1)
                .filter(|i| stream.kind(*i) == Some(TokenKind::Identifier))?;
            let eq = stream
                .next_significant(name + 1)
                .filter(|i| stream.kind(*i) == Some(TokenKind::Eq))?;
            (eq < ctor.body_close).then(|| stream.text(name).to_owned())
        })();
        if let Some(name) = assigned {
            out.insert(name);
        }
    }
    out
}

/// `parent::__construct(` at the top level of the constructor body.
fn parent_constructor_call(stream: &TokenStream, ctor: &Constructor) -> Option<usize> {
    let mut idx = ctor.body_open + 1;
    while idx < ctor.body_close {
        let token = stream.get(idx)?;
        if token.kind.closing_bracket().is_some() {
            idx = stream.matching_close(idx)? + 1;
            continue;
        }
        if token.is_word("parent") {
            let call = (|| {
                let colons = stream
                    .next_significant(idx + 1)
                    .filter(|i| stream.kind(*i) == Some(TokenKind::DoubleColon))?;
                let name = stream.next_significant(colons + 1)?;
                stream.get(name)?.is_word("__construct").then_some(idx)
            })();
            if call.is_some() {
                return call;
            }
        }
        idx += 1;
    }
    None
}

/// Leading whitespace of the line holding the token at `index`.
fn line_indent(stream: &TokenStream, index: usize) -> String {
    let mut line = String::new();
    for idx in (0..index).rev() {
        let text = stream.text(idx);
        if let Some(pos) = text.rfind(['\n', '\r']) {
            line.insert_str(0, &text[pos + 1..]);
            break;
        }
        line.insert_str(0, text);
    }
    line.chars().take_while(|c| *c == ' ' || *c == '\t').collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_config::CollisionPolicy;
    use pretty_assertions::assert_eq;

    fn requirements(vars: &[(&str, &str)]) -> DiRequirements {
        let mut reqs = DiRequirements::new();
        for (name, ty) in vars {
            reqs.record(DiVariable::new(*name, *ty), CollisionPolicy::LastWins)
                .unwrap();
        }
        reqs
    }

    fn inject(source: &str, vars: &[(&str, &str)]) -> Result<String, InjectError> {
        let stream = TokenStream::from_source(source);
        let edits = ConstructorInjector::default().inject(&stream, &requirements(vars))?;
        Ok(stream.apply(edits).unwrap().render())
    }

    #[test]
    fn finds_declaring_class_keyword() {
        let stream = TokenStream::from_source("<?php $a = Foo::class; $b = new class {}; final class Bar {}");
        let idx = class_declaration_keyword(&stream).unwrap();
        assert_eq!(stream.text(stream.next_significant(idx + 1).unwrap()), "Bar");

        let stream = TokenStream::from_source("<?php echo Foo::class;");
        assert_eq!(class_declaration_keyword(&stream), None);
    }

    #[test]
    fn synthesizes_constructor_when_missing() {
        let source = "<?php\nclass Foo extends Bar\n{\n    public function run()\n    {\n        return 1;\n    }\n}\n";
        let out = inject(source, &[("logger", "\\Psr\\Log\\LoggerInterface")]).unwrap();
        let expected = "<?php\nclass Foo extends Bar\n{\n    /**\n     * @var \\Psr\\Log\\LoggerInterface\n     */\n    protected $logger;\n\n    /**\n     * @param \\Psr\\Log\\LoggerInterface $logger\n     */\n    public function __construct(\n        \\Psr\\Log\\LoggerInterface $logger\n    ) {\n        $this->logger = $logger;\n    }\n\n    public function run()\n    {\n        return 1;\n    }\n}\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn extends_multiline_constructor_before_parent_call() {
        let source = "<?php
class Foo extends Bar
{
    protected $registry;

    public function __construct(
        \\Magento\\Framework\\Registry $registry,
        array $data = []
    ) {
        $this->registry = $registry;
        parent::__construct($data);
    }
}
";
        let out = inject(
            source,
            &[
                ("registry", "\\Magento\\Framework\\Registry"),
                ("logger", "\\Psr\\Log\\LoggerInterface"),
            ],
        )
        .unwrap();
        let expected = "<?php
class Foo extends Bar
{
    /**
     * @var \\Psr\\Log\\LoggerInterface
     */
    protected $logger;

    protected $registry;

    public function __construct(
        \\Magento\\Framework\\Registry $registry,
        \\Psr\\Log\\LoggerInterface $logger,
        array $data = []
    ) {
        $this->registry = $registry;
        $this->logger = $logger;
        parent::__construct($data);
    }
}
";
        assert_eq!(out, expected);
    }

    #[test]
    fn appends_to_single_line_constructor() {
        let source = "<?php
class Foo
{
    public function __construct(Bar $bar)
    {
        $this->bar = $bar; // keep
    }
}
";
        let out = inject(source, &[("registry", "\\Magento\\Framework\\Registry")]).unwrap();
        assert!(out.contains("public function __construct(Bar $bar, \\Magento\\Framework\\Registry $registry)"));
        assert!(out.contains(
            "        $this->bar = $bar; // keep\n        $this->registry = $registry;\n    }"
        ));
        assert!(out.contains("    protected $registry;\n"));
    }

    #[test]
    fn respects_trailing_commas() {
        let source = "<?php
class Foo
{
    public function __construct(
        Bar $bar,
    ) {
    }
}
";
        let out = inject(source, &[("logger", "\\Psr\\Log\\LoggerInterface")]).unwrap();
        assert!(out.contains(
            "        Bar $bar,\n        \\Psr\\Log\\LoggerInterface $logger,\n    ) {"
        ), "{out}");
        assert!(out.contains("    ) {\n        $this->logger = $logger;\n    }"), "{out}");
    }

    #[test]
    fn empty_constructor_gets_parameter_and_body() {
        let source = "<?php class Foo { public function __construct() {} }";
        let out = inject(source, &[("registry", "\\Magento\\Framework\\Registry")]).unwrap();
        assert!(out.contains("public function __construct(\\Magento\\Framework\\Registry $registry) {\n    $this->registry = $registry;\n}"), "{out}");
        assert!(TokenStream::from_source(&out).is_balanced());
    }

    #[test]
    fn promoted_and_existing_parameters_are_not_repeated() {
        let source = "<?php
class Foo
{
    public function __construct(private \\Psr\\Log\\LoggerInterface $logger, $registry)
    {
    }
}
";
        let out = inject(
            source,
            &[
                ("logger", "\\Psr\\Log\\LoggerInterface"),
                ("registry", "\\Magento\\Framework\\Registry"),
            ],
        )
        .unwrap();
        assert_eq!(out.matches("$logger").count(), 1, "{out}");
        assert_eq!(out.matches("$registry").count(), 3, "{out}");
        assert!(out.contains("$this->registry = $registry;"));
        assert!(!out.contains("$this->logger"));
    }

    #[test]
    fn variadic_parameter_stays_last() {
        let source = "<?php
class Foo
{
    public function __construct(Bar ...$bars)
    {
        $this->bars = $bars;
    }
}
";
        let out = inject(source, &[("logger", "\\Psr\\Log\\LoggerInterface")]).unwrap();
        assert!(
            out.contains("public function __construct(\\Psr\\Log\\LoggerInterface $logger, Bar ...$bars)"),
            "{out}"
        );
        assert!(!out.contains("...$bars, "), "{out}");

        let source = "<?php
class Foo
{
    public function __construct(
        Bar $bar,
        Baz ...$rest,
    ) {
    }
}
";
        let out = inject(source, &[("registry", "\\Magento\\Framework\\Registry")]).unwrap();
        assert!(out.contains(
            "        Bar $bar,\n        \\Magento\\Framework\\Registry $registry,\n        Baz ...$rest,\n    ) {"
        ), "{out}");
    }

    #[test]
    fn abstract_constructor_is_malformed() {
        let source = "<?php abstract class Foo { abstract public function __construct(); }";
        let err = inject(source, &[("logger", "\\Psr\\Log\\LoggerInterface")]).unwrap_err();
        assert!(matches!(
            err,
            InjectError::MalformedConstructor {
                reason: "constructor has no body",
                ..
            }
        ));
        assert!(err.span().is_some());
    }

    #[test]
    fn missing_or_unbalanced_class_body() {
        let err = inject("<?php echo Foo::class;", &[("a", "\\A")]).unwrap_err();
        assert_eq!(err, InjectError::ClassBodyNotFound);

        let err = inject("<?php class Foo { public function x() {", &[("a", "\\A")]).unwrap_err();
        assert!(matches!(err, InjectError::UnbalancedClassBody { .. }));
    }

    #[test]
    fn indentation_follows_configured_unit() {
        let stream = TokenStream::from_source("<?php\nclass Foo\n{\n}\n");
        let edits = ConstructorInjector::new("\t")
            .inject(&stream, &requirements(&[("a", "\\A")]))
            .unwrap();
        let out = stream.apply(edits).unwrap().render();
        assert!(out.contains("\n\tprotected $a;\n"), "{out}");
        assert!(out.contains("\n\t\t$this->a = $a;\n\t}\n"), "{out}");
    }
}
