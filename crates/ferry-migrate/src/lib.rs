//! Rewriting of Magento 1 `Mage::` calls into Magento 2 dependency-injected
//! code.
//!
//! A [`MageProcessor`] runs per file: it scans the token stream for legacy
//! calls with a [`MageCallMatcher`], applies their rewrites in one batch,
//! then asks a [`DependencyInjector`] to add the collaborators those
//! rewrites reference to the class constructor.

mod injector;
mod invocation;
mod matcher;
mod processor;
mod requirements;
mod resolver;

pub use ferry_config::CollisionPolicy;
pub use injector::{class_declaration_keyword, ConstructorInjector, DependencyInjector, InjectError};
pub use invocation::{DiVariable, MatchedInvocation};
pub use matcher::{
    MageCallMatcher, MagePattern, CATALOG, EVENT_MANAGER_TYPE, LOCALIZED_EXCEPTION_TYPE,
    LOGGER_TYPE, REGISTRY_TYPE, SCOPE_CONFIG_TYPE, STORE_MANAGER_TYPE,
};
pub use processor::{
    FileReport, InvocationReport, MageProcessor, ProcessError, ProcessOutcome, ProcessPhase,
};
pub use requirements::{DiRequirements, Recorded, RequirementConflict};
pub use resolver::{
    di_variable_name, helper_variable_name, AliasKind, ClassAliasResolver, ResolveError,
};
