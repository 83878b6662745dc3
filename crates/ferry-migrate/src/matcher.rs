//! The catalog of recognized `Mage::` call shapes.

use ferry_core::TokenSpan;
use ferry_syntax::{TokenKind, TokenStream};
use serde::Serialize;

use crate::resolver::{di_variable_name, helper_variable_name, AliasKind, ClassAliasResolver};
use crate::{DiVariable, MatchedInvocation};

pub const SCOPE_CONFIG_TYPE: &str = "\\Magento\\Framework\\App\\Config\\ScopeConfigInterface";
pub const EVENT_MANAGER_TYPE: &str = "\\Magento\\Framework\\Event\\ManagerInterface";
pub const REGISTRY_TYPE: &str = "\\Magento\\Framework\\Registry";
pub const LOGGER_TYPE: &str = "\\Psr\\Log\\LoggerInterface";
pub const STORE_MANAGER_TYPE: &str = "\\Magento\\Store\\Model\\StoreManagerInterface";
pub const LOCALIZED_EXCEPTION_TYPE: &str = "\\Magento\\Framework\\Exception\\LocalizedException";

const SCOPE_STORE: &str = "\\Magento\\Store\\Model\\ScopeInterface::SCOPE_STORE";

const STORE_MANAGER_METHODS: &[&str] = &[
    "getStore",
    "getStores",
    "getWebsite",
    "getWebsites",
    "getDefaultStoreView",
];

/// Recognized legacy call shapes.
///
/// Variants are tried in [`CATALOG`] order at a given token; the first one
/// that matches wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MagePattern {
    /// `Mage::helper('x')->__(` becomes `__(`.
    HelperTranslate,
    /// `Mage::helper('x')` becomes `$this->xHelper`.
    Helper,
    /// `Mage::getModel('a/b')` becomes `$this->abFactory->create()`.
    GetModel,
    /// `Mage::getSingleton('a/b')` becomes `$this->ab`.
    GetSingleton,
    /// `Mage::getResourceModel('a/b')` becomes a resource model factory call.
    GetResourceModel,
    /// `Mage::getStoreConfig(path)` becomes `$this->scopeConfig->getValue(path, SCOPE_STORE)`.
    GetStoreConfig,
    /// `Mage::getStoreConfigFlag(path)` becomes `$this->scopeConfig->isSetFlag(path, SCOPE_STORE)`.
    GetStoreConfigFlag,
    /// `Mage::dispatchEvent` becomes `$this->eventManager->dispatch`.
    DispatchEvent,
    /// `Mage::registry`, `Mage::register` and `Mage::unregister`.
    Registry,
    /// `Mage::log` and `Mage::logException`.
    Log,
    /// `Mage::throwException(msg)` becomes `throw new LocalizedException(__(msg))`.
    ThrowException,
    /// `Mage::app()->getStore` and the other store manager getters.
    AppStore,
}

pub const CATALOG: &[MagePattern] = &[
    MagePattern::HelperTranslate,
    MagePattern::Helper,
    MagePattern::GetModel,
    MagePattern::GetSingleton,
    MagePattern::GetResourceModel,
    MagePattern::GetStoreConfig,
    MagePattern::GetStoreConfigFlag,
    MagePattern::DispatchEvent,
    MagePattern::Registry,
    MagePattern::Log,
    MagePattern::ThrowException,
    MagePattern::AppStore,
];

impl MagePattern {
    pub fn name(self) -> &'static str {
        match self {
            MagePattern::HelperTranslate => "helper-translate",
            MagePattern::Helper => "helper",
            MagePattern::GetModel => "get-model",
            MagePattern::GetSingleton => "get-singleton",
            MagePattern::GetResourceModel => "get-resource-model",
            MagePattern::GetStoreConfig => "get-store-config",
            MagePattern::GetStoreConfigFlag => "get-store-config-flag",
            MagePattern::DispatchEvent => "dispatch-event",
            MagePattern::Registry => "registry",
            MagePattern::Log => "log",
            MagePattern::ThrowException => "throw-exception",
            MagePattern::AppStore => "app-store",
        }
    }

    /// `Mage::` static methods this pattern starts with.
    pub fn methods(self) -> &'static [&'static str] {
        match self {
            MagePattern::HelperTranslate | MagePattern::Helper => &["helper"],
            MagePattern::GetModel => &["getModel"],
            MagePattern::GetSingleton => &["getSingleton"],
            MagePattern::GetResourceModel => &["getResourceModel"],
            MagePattern::GetStoreConfig => &["getStoreConfig"],
            MagePattern::GetStoreConfigFlag => &["getStoreConfigFlag"],
            MagePattern::DispatchEvent => &["dispatchEvent"],
            MagePattern::Registry => &["registry", "register", "unregister"],
            MagePattern::Log => &["log", "logException"],
            MagePattern::ThrowException => &["throwException"],
            MagePattern::AppStore => &["app"],
        }
    }

    /// Canonical spelling of `method` if this pattern accepts it.
    fn accepts(self, method: &str) -> Option<&'static str> {
        self.methods()
            .iter()
            .copied()
            .find(|m| m.eq_ignore_ascii_case(method))
    }
}

impl std::fmt::Display for MagePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// `Mage :: method`
#[derive(Debug, Clone, Copy)]
struct CallHead<'a> {
    mage: usize,
    method: usize,
    name: &'a str,
}

fn call_head(stream: &TokenStream, index: usize) -> Option<CallHead<'_>> {
    let token = stream.get(index)?;
    let is_mage = match token.kind {
        TokenKind::Identifier => token.text.eq_ignore_ascii_case("Mage"),
        TokenKind::QualifiedName => token.text.eq_ignore_ascii_case("\\Mage"),
        _ => false,
    };
    if !is_mage {
        return None;
    }
    if let Some(prev) = stream.prev_significant(index) {
        if matches!(
            stream.kind(prev),
            Some(TokenKind::Arrow | TokenKind::NullsafeArrow | TokenKind::DoubleColon)
        ) {
            return None;
        }
    }
    let colons = next_of_kind(stream, index, TokenKind::DoubleColon)?;
    let method = next_of_kind(stream, colons, TokenKind::Identifier)?;
    Some(CallHead {
        mage: index,
        method,
        name: stream.text(method),
    })
}

/// Next significant token after `index`, if it has `kind`.
fn next_of_kind(stream: &TokenStream, index: usize, kind: TokenKind) -> Option<usize> {
    let next = stream.next_significant(index + 1)?;
    (stream.kind(next) == Some(kind)).then_some(next)
}

/// `( 'alias' )` after the method name.
struct LiteralArgument {
    close: usize,
    value: String,
}

fn literal_argument(stream: &TokenStream, method: usize) -> Option<LiteralArgument> {
    let open = next_of_kind(stream, method, TokenKind::LParen)?;
    let literal = next_of_kind(stream, open, TokenKind::StringLiteral)?;
    let close = next_of_kind(stream, literal, TokenKind::RParen)?;
    let value = unquote(stream.text(literal))?;
    Some(LiteralArgument { close, value })
}

/// Contents of a string literal without escapes or interpolation.
fn unquote(text: &str) -> Option<String> {
    let inner = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .or_else(|| text.strip_prefix('"').and_then(|t| t.strip_suffix('"')))?;
    if inner.contains(['\\', '$', '\'', '"']) {
        return None;
    }
    Some(inner.to_owned())
}

/// A parenthesized argument list after the method name.
struct CallArguments {
    open: usize,
    close: usize,
    commas: Vec<usize>,
}

impl CallArguments {
    fn is_empty(&self, stream: &TokenStream) -> bool {
        stream.next_significant(self.open + 1) == Some(self.close)
    }
}

fn call_arguments(stream: &TokenStream, method: usize) -> Option<CallArguments> {
    let open = next_of_kind(stream, method, TokenKind::LParen)?;
    let close = stream.matching_close(open)?;
    let mut commas = Vec::new();
    let mut idx = open + 1;
    while idx < close {
        let kind = stream.kind(idx)?;
        if kind.closing_bracket().is_some() {
            idx = stream.matching_close(idx)? + 1;
            continue;
        }
        if kind == TokenKind::Comma {
            commas.push(idx);
        }
        idx += 1;
    }
    Some(CallArguments {
        open,
        close,
        commas,
    })
}

/// Recognizes legacy calls at a single token index.
#[derive(Debug, Clone, Default)]
pub struct MageCallMatcher {
    resolver: ClassAliasResolver,
}

impl MageCallMatcher {
    pub fn new(resolver: ClassAliasResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &ClassAliasResolver {
        &self.resolver
    }

    /// Try every pattern of the catalog at `index`.
    ///
    /// This never modifies `stream`; the returned invocation carries the edits
    /// to apply later.
    pub fn match_at(&self, stream: &TokenStream, index: usize) -> Option<MatchedInvocation> {
        let head = call_head(stream, index)?;
        let matched = CATALOG
            .iter()
            .find_map(|pattern| self.match_pattern(*pattern, stream, head));
        match &matched {
            Some(invocation) => tracing::debug!(
                target: "ferry.migrate",
                pattern = %invocation.pattern,
                span = %invocation.span,
                legacy = %invocation.legacy_symbol,
                "matched legacy call"
            ),
            None => tracing::trace!(
                target: "ferry.migrate",
                index,
                method = head.name,
                "unrecognized Mage call"
            ),
        }
        matched
    }

    fn match_pattern(
        &self,
        pattern: MagePattern,
        stream: &TokenStream,
        head: CallHead<'_>,
    ) -> Option<MatchedInvocation> {
        let method = pattern.accepts(head.name)?;
        match pattern {
            MagePattern::HelperTranslate => match_helper_translate(stream, head),
            MagePattern::Helper => self.match_helper(stream, head),
            MagePattern::GetModel => self.match_model(pattern, stream, head, AliasKind::Model, true),
            MagePattern::GetSingleton => {
                self.match_model(pattern, stream, head, AliasKind::Model, false)
            }
            MagePattern::GetResourceModel => {
                self.match_model(pattern, stream, head, AliasKind::ResourceModel, true)
            }
            MagePattern::GetStoreConfig => match_store_config(pattern, stream, head, "getValue"),
            MagePattern::GetStoreConfigFlag => {
                match_store_config(pattern, stream, head, "isSetFlag")
            }
            MagePattern::DispatchEvent => match_collaborator_call(
                pattern,
                stream,
                head,
                method,
                DiVariable::new("eventManager", EVENT_MANAGER_TYPE),
                "dispatch",
            ),
            MagePattern::Registry => match_collaborator_call(
                pattern,
                stream,
                head,
                method,
                DiVariable::new("registry", REGISTRY_TYPE),
                method,
            ),
            MagePattern::Log => {
                let level = if method == "logException" {
                    "critical"
                } else {
                    "debug"
                };
                match_collaborator_call(
                    pattern,
                    stream,
                    head,
                    method,
                    DiVariable::new("logger", LOGGER_TYPE),
                    level,
                )
            }
            MagePattern::ThrowException => match_throw_exception(stream, head),
            MagePattern::AppStore => match_app_store(stream, head),
        }
    }

    fn match_helper(&self, stream: &TokenStream, head: CallHead<'_>) -> Option<MatchedInvocation> {
        let arg = literal_argument(stream, head.method)?;
        let class = self.resolver.resolve(&arg.value, AliasKind::Helper)?;
        let name = helper_variable_name(&class);
        let span = TokenSpan::new(head.mage, arg.close + 1);
        Some(
            MatchedInvocation::new(
                MagePattern::Helper,
                span,
                span.end,
                format!("Mage::helper('{}')", arg.value),
                class.clone(),
            )
            .replace(span, format!("$this->{name}"))
            .with_di_variable(DiVariable::new(name, class)),
        )
    }

    /// `getModel`, `getSingleton` and `getResourceModel`; `factory` selects
    /// injecting `<Class>Factory` and calling `create()` on it.
    fn match_model(
        &self,
        pattern: MagePattern,
        stream: &TokenStream,
        head: CallHead<'_>,
        kind: AliasKind,
        factory: bool,
    ) -> Option<MatchedInvocation> {
        let arg = literal_argument(stream, head.method)?;
        let class = self.resolver.resolve(&arg.value, kind)?;
        let injected = if factory {
            format!("{class}Factory")
        } else {
            class
        };
        let name = di_variable_name(&injected);
        let modern = if factory {
            format!("$this->{name}->create()")
        } else {
            format!("$this->{name}")
        };
        let span = TokenSpan::new(head.mage, arg.close + 1);
        Some(
            MatchedInvocation::new(
                pattern,
                span,
                span.end,
                format!("Mage::{}('{}')", head.name, arg.value),
                injected.clone(),
            )
            .replace(span, modern)
            .with_di_variable(DiVariable::new(name, injected)),
        )
    }
}

fn match_helper_translate(stream: &TokenStream, head: CallHead<'_>) -> Option<MatchedInvocation> {
    let arg = literal_argument(stream, head.method)?;
    let arrow = next_of_kind(stream, arg.close, TokenKind::Arrow)?;
    let translate = next_of_kind(stream, arrow, TokenKind::Identifier)?;
    if stream.text(translate) != "__" {
        return None;
    }
    next_of_kind(stream, translate, TokenKind::LParen)?;
    let span = TokenSpan::new(head.mage, translate + 1);
    Some(
        MatchedInvocation::new(
            MagePattern::HelperTranslate,
            span,
            span.end,
            format!("Mage::helper('{}')->__", arg.value),
            "__",
        )
        .replace(span, "__"),
    )
}

fn match_store_config(
    pattern: MagePattern,
    stream: &TokenStream,
    head: CallHead<'_>,
    getter: &str,
) -> Option<MatchedInvocation> {
    let args = call_arguments(stream, head.method)?;
    if args.is_empty(stream) {
        return None;
    }
    let head_span = TokenSpan::new(head.mage, args.open + 1);
    let span = TokenSpan::new(head.mage, args.close + 1);
    let invocation = MatchedInvocation::new(
        pattern,
        span,
        head_span.end,
        format!("Mage::{}", head.name),
        SCOPE_CONFIG_TYPE,
    )
    .replace(head_span, format!("$this->scopeConfig->{getter}("))
    .with_di_variable(DiVariable::new("scopeConfig", SCOPE_CONFIG_TYPE));

    // An explicit store argument moves behind the scope type.
    match args.commas.as_slice() {
        [] => Some(invocation.insert(args.close, format!(", {SCOPE_STORE}"))),
        [comma] => Some(invocation.replace(
            TokenSpan::new(*comma, comma + 1),
            format!(", {SCOPE_STORE},"),
        )),
        _ => None,
    }
}

/// `Mage::method` replaced by `$this->variable->target`, arguments untouched.
fn match_collaborator_call(
    pattern: MagePattern,
    stream: &TokenStream,
    head: CallHead<'_>,
    method: &str,
    variable: DiVariable,
    target: &str,
) -> Option<MatchedInvocation> {
    next_of_kind(stream, head.method, TokenKind::LParen)?;
    let span = TokenSpan::new(head.mage, head.method + 1);
    Some(
        MatchedInvocation::new(
            pattern,
            span,
            span.end,
            format!("Mage::{method}"),
            variable.ty.clone(),
        )
        .replace(span, format!("$this->{}->{target}", variable.name))
        .with_di_variable(variable),
    )
}

fn match_throw_exception(stream: &TokenStream, head: CallHead<'_>) -> Option<MatchedInvocation> {
    let args = call_arguments(stream, head.method)?;
    if args.is_empty(stream) {
        return None;
    }
    let head_span = TokenSpan::new(head.mage, args.open + 1);
    let span = TokenSpan::new(head.mage, args.close + 1);
    let invocation = MatchedInvocation::new(
        MagePattern::ThrowException,
        span,
        head_span.end,
        "Mage::throwException".to_owned(),
        LOCALIZED_EXCEPTION_TYPE,
    );
    if is_translated_argument(stream, &args) {
        Some(invocation.replace(head_span, format!("throw new {LOCALIZED_EXCEPTION_TYPE}(")))
    } else {
        Some(
            invocation
                .replace(head_span, format!("throw new {LOCALIZED_EXCEPTION_TYPE}(__("))
                .insert(args.close, ")"),
        )
    }
}

/// The single argument is already a translation call: `__(...)` or
/// `Mage::helper('x')->__(...)`.
fn is_translated_argument(stream: &TokenStream, args: &CallArguments) -> bool {
    let translated = || -> Option<()> {
        let first = stream.next_significant(args.open + 1)?;
        let translate_end = if stream.get(first)?.is_word("__") {
            first + 1
        } else {
            match_helper_translate(stream, call_head(stream, first)?)?.span.end
        };
        let open = next_of_kind(stream, translate_end - 1, TokenKind::LParen)?;
        let close = stream.matching_close(open)?;
        (stream.next_significant(close + 1)? == args.close).then_some(())
    };
    translated().is_some()
}

fn match_app_store(stream: &TokenStream, head: CallHead<'_>) -> Option<MatchedInvocation> {
    let open = next_of_kind(stream, head.method, TokenKind::LParen)?;
    let close = next_of_kind(stream, open, TokenKind::RParen)?;
    let arrow = next_of_kind(stream, close, TokenKind::Arrow)?;
    let getter_idx = next_of_kind(stream, arrow, TokenKind::Identifier)?;
    let getter = STORE_MANAGER_METHODS
        .iter()
        .copied()
        .find(|m| m.eq_ignore_ascii_case(stream.text(getter_idx)))?;
    let span = TokenSpan::new(head.mage, getter_idx + 1);
    let variable = DiVariable::new("storeManager", STORE_MANAGER_TYPE);
    Some(
        MatchedInvocation::new(
            MagePattern::AppStore,
            span,
            span.end,
            format!("Mage::app()->{getter}"),
            STORE_MANAGER_TYPE,
        )
        .replace(span, format!("$this->storeManager->{getter}"))
        .with_di_variable(variable),
    )
}
