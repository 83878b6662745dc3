use ferry_config::{CollisionPolicy, MigrateConfig};
use ferry_core::{EditError, EditSet, FileId, LineIndex, TokenSpan};
use ferry_syntax::{TokenKind, TokenStream};
use serde::Serialize;
use thiserror::Error;

use crate::injector::class_declaration_keyword;
use crate::{
    ClassAliasResolver, ConstructorInjector, DependencyInjector, DiRequirements, DiVariable,
    InjectError, MageCallMatcher, MagePattern, MatchedInvocation, Recorded, ResolveError,
};

/// Steps of [`MageProcessor::process`], in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProcessPhase {
    Init,
    Gate,
    Scanning,
    Injecting,
    Refreshed,
    Done,
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("{file}: cannot inject dependencies")]
    Inject {
        file: FileId,
        #[source]
        source: InjectError,
    },
    #[error(
        "{file}: `${name}` is required as both {first} and {second} by {pattern} at tokens {span}"
    )]
    ConflictingRequirement {
        file: FileId,
        name: String,
        first: String,
        second: String,
        pattern: MagePattern,
        span: TokenSpan,
    },
    #[error("{file}: failed to apply edits")]
    Edit {
        file: FileId,
        #[source]
        source: EditError,
    },
}

impl ProcessError {
    pub fn file(&self) -> &FileId {
        match self {
            ProcessError::Inject { file, .. }
            | ProcessError::ConflictingRequirement { file, .. }
            | ProcessError::Edit { file, .. } => file,
        }
    }
}

/// One rewritten call, as shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationReport {
    pub pattern: MagePattern,
    /// One-based line of the call in the input.
    pub line: u32,
    pub legacy: String,
    pub modern: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file: FileId,
    pub invocations: Vec<InvocationReport>,
    pub requirements: Vec<DiVariable>,
}

impl FileReport {
    fn new(
        file: &FileId,
        input: &TokenStream,
        invocations: &[MatchedInvocation],
        requirements: &DiRequirements,
    ) -> Self {
        let lines = LineIndex::new(&input.render());
        let invocations = invocations
            .iter()
            .map(|inv| InvocationReport {
                pattern: inv.pattern,
                line: lines
                    .line_col(input.byte_offset(inv.span.start))
                    .display_line(),
                legacy: inv.legacy_symbol.clone(),
                modern: inv.modern_form().to_owned(),
            })
            .collect();
        Self {
            file: file.clone(),
            invocations,
            requirements: requirements.as_slice().to_vec(),
        }
    }
}

#[derive(Debug)]
pub enum ProcessOutcome {
    /// The file declares no class; `tokens` is the input, untouched.
    Skipped { tokens: TokenStream },
    Converted {
        tokens: TokenStream,
        report: FileReport,
    },
}

impl ProcessOutcome {
    pub fn tokens(&self) -> &TokenStream {
        match self {
            ProcessOutcome::Skipped { tokens } | ProcessOutcome::Converted { tokens, .. } => tokens,
        }
    }

    pub fn into_tokens(self) -> TokenStream {
        match self {
            ProcessOutcome::Skipped { tokens } | ProcessOutcome::Converted { tokens, .. } => tokens,
        }
    }

    pub fn report(&self) -> Option<&FileReport> {
        match self {
            ProcessOutcome::Skipped { .. } => None,
            ProcessOutcome::Converted { report, .. } => Some(report),
        }
    }
}

/// Per-file migration pipeline.
///
/// A processor holds no per-file state and can be shared across threads.
#[derive(Debug)]
pub struct MageProcessor {
    matcher: MageCallMatcher,
    injector: Box<dyn DependencyInjector>,
    policy: CollisionPolicy,
}

impl MageProcessor {
    pub fn new(matcher: MageCallMatcher, injector: Box<dyn DependencyInjector>) -> Self {
        Self {
            matcher,
            injector,
            policy: CollisionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CollisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn from_config(config: &MigrateConfig) -> Result<Self, ResolveError> {
        let resolver = ClassAliasResolver::from_config(config)?;
        Ok(Self::new(
            MageCallMatcher::new(resolver),
            Box::new(ConstructorInjector::new(config.indent.clone())),
        )
        .with_policy(config.collision_policy))
    }

    pub fn matcher(&self) -> &MageCallMatcher {
        &self.matcher
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Rewrite every legacy call of `stream` and inject the collaborators
    /// they need into the file's class.
    ///
    /// Files without a class declaration are returned unchanged. Rewrites are
    /// applied in one batch, injection in a second one, and the result is
    /// re-lexed before it is returned.
    pub fn process(
        &self,
        file: &FileId,
        stream: TokenStream,
    ) -> Result<ProcessOutcome, ProcessError> {
        enter(file, ProcessPhase::Init);

        enter(file, ProcessPhase::Gate);
        if class_declaration_keyword(&stream).is_none() {
            enter(file, ProcessPhase::Done);
            return Ok(ProcessOutcome::Skipped { tokens: stream });
        }

        enter(file, ProcessPhase::Scanning);
        let invocations = self.scan(file, &stream);
        let requirements = self.collect_requirements(file, &invocations)?;

        let mut edits = EditSet::new();
        for invocation in &invocations {
            edits.extend(invocation.convert_to_m2());
        }
        let edit_error = |source| ProcessError::Edit {
            file: file.clone(),
            source,
        };
        let mut rewritten = stream.apply(edits).map_err(edit_error)?;

        if !requirements.is_empty() {
            enter(file, ProcessPhase::Injecting);
            let edits = self
                .injector
                .inject(&rewritten, &requirements)
                .map_err(|source| ProcessError::Inject {
                    file: file.clone(),
                    source,
                })?;
            rewritten = rewritten.apply(edits).map_err(edit_error)?;
        }

        enter(file, ProcessPhase::Refreshed);
        let tokens = rewritten.refresh();
        let report = FileReport::new(file, &stream, &invocations, &requirements);

        enter(file, ProcessPhase::Done);
        Ok(ProcessOutcome::Converted { tokens, report })
    }

    /// Read-only pass collecting non-overlapping matches.
    ///
    /// Calls that need an injected collaborator are left in place inside
    /// `static` functions, where `$this` is unavailable.
    fn scan(&self, file: &FileId, stream: &TokenStream) -> Vec<MatchedInvocation> {
        let static_bodies = static_function_bodies(stream);
        let mut found = Vec::new();
        let mut index = 0;
        while index + 3 < stream.len() {
            match self.matcher.match_at(stream, index) {
                Some(invocation) => {
                    index = invocation.head_end.max(index + 1);
                    let in_static = static_bodies.iter().any(|body| {
                        body.start < invocation.span.start && invocation.span.end <= body.end
                    });
                    if in_static && invocation.di_variable.is_some() {
                        tracing::warn!(
                            target: "ferry.migrate",
                            file = %file,
                            pattern = invocation.pattern.name(),
                            legacy = %invocation.legacy_symbol,
                            "legacy call in static context left unconverted"
                        );
                        continue;
                    }
                    found.push(invocation);
                }
                None => index += 1,
            }
        }
        found
    }

    fn collect_requirements(
        &self,
        file: &FileId,
        invocations: &[MatchedInvocation],
    ) -> Result<DiRequirements, ProcessError> {
        let mut requirements = DiRequirements::new();
        for invocation in invocations {
            let Some(variable) = &invocation.di_variable else {
                continue;
            };
            match requirements.record(variable.clone(), self.policy) {
                Ok(Recorded::Replaced { previous }) => tracing::warn!(
                    target: "ferry.migrate",
                    file = %file,
                    name = %variable.name,
                    previous = %previous.ty,
                    current = %variable.ty,
                    "dependency requirement overwritten"
                ),
                Ok(Recorded::Added | Recorded::Duplicate) => {}
                Err(conflict) => {
                    return Err(ProcessError::ConflictingRequirement {
                        file: file.clone(),
                        name: conflict.name,
                        first: conflict.first,
                        second: conflict.second,
                        pattern: invocation.pattern,
                        span: invocation.span,
                    })
                }
            }
        }
        Ok(requirements)
    }
}

/// Bodies of `static` methods and closures, including everything nested in
/// them.
fn static_function_bodies(stream: &TokenStream) -> Vec<TokenSpan> {
    let mut bodies = Vec::new();
    let mut from = 0;
    while let Some(function_kw) = stream.next_index_of_kind(from, TokenKind::FunctionKw) {
        from = function_kw + 1;
        if !is_static_function(stream, function_kw) {
            continue;
        }
        let Some(body_open) = function_body_open(stream, function_kw) else {
            continue;
        };
        if let Some(body_close) = stream.matching_close(body_open) {
            bodies.push(TokenSpan::new(body_open, body_close + 1));
        }
    }
    bodies
}

fn is_static_function(stream: &TokenStream, function_kw: usize) -> bool {
    let mut idx = function_kw;
    while let Some(prev) = stream.prev_significant(idx) {
        match stream.kind(prev) {
            Some(TokenKind::StaticKw) => return true,
            Some(kind) if kind.is_modifier() => idx = prev,
            _ => return false,
        }
    }
    false
}

/// `{` after the parameter list, return type and closure `use (...)`;
/// `None` for abstract and interface methods.
fn function_body_open(stream: &TokenStream, function_kw: usize) -> Option<usize> {
    let params_open = stream.next_index_of_kind(function_kw, TokenKind::LParen)?;
    let mut idx = stream.matching_close(params_open)? + 1;
    loop {
        match stream.kind(idx)? {
            TokenKind::LBrace => return Some(idx),
            TokenKind::Semicolon => return None,
            TokenKind::LParen => idx = stream.matching_close(idx)? + 1,
            _ => idx += 1,
        }
    }
}

fn enter(file: &FileId, phase: ProcessPhase) {
    tracing::trace!(target: "ferry.migrate", file = %file, ?phase, "migration phase");
}
