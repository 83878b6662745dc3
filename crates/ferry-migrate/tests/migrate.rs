use ferry_core::FileId;
use ferry_migrate::{
    ClassAliasResolver, CollisionPolicy, ConstructorInjector, DiVariable, InjectError,
    MageCallMatcher, MagePattern, MageProcessor, ProcessError, ProcessOutcome,
};
use ferry_syntax::{lex_with_errors, TokenStream};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn processor() -> MageProcessor {
    MageProcessor::new(
        MageCallMatcher::default(),
        Box::new(ConstructorInjector::default()),
    )
}

fn run(processor: &MageProcessor, source: &str) -> Result<ProcessOutcome, ProcessError> {
    processor.process(&FileId::new("Test.php"), TokenStream::from_source(source))
}

fn convert(source: &str) -> String {
    run(&processor(), source).unwrap().into_tokens().render()
}

/// A processor where `acme/session` resolves to a class whose injected name
/// collides with `customer/session`.
fn colliding_processor() -> MageProcessor {
    let resolver = ClassAliasResolver::new()
        .with_class_alias("acme/session", "\\Acme\\Customer\\Session")
        .unwrap();
    MageProcessor::new(
        MageCallMatcher::new(resolver),
        Box::new(ConstructorInjector::default()),
    )
}

const COLLIDING: &str = "<?php
class Foo
{
    public function run()
    {
        Mage::getSingleton('customer/session')->logout();
        Mage::getSingleton('acme/session')->start();
    }
}
";

#[test]
fn plain_script_is_returned_unchanged() {
    let source = "<?php\n$product = Mage::getModel('catalog/product');\n$product->load(1);\necho Foo::class;\n";
    let input = TokenStream::from_source(source);
    let outcome = processor()
        .process(&FileId::new("script.php"), input.clone())
        .unwrap();
    assert!(matches!(outcome, ProcessOutcome::Skipped { .. }));
    assert!(outcome.report().is_none());
    assert_eq!(outcome.into_tokens(), input);
}

#[test]
fn catalog_product_call_is_routed_through_injected_factory() {
    let source = "<?php
class Acme_Catalog_Block_View
{
    public function getProduct($id)
    {
        return Mage::getModel('catalog/product')->load($id);
    }
}
";
    let expected = "<?php
class Acme_Catalog_Block_View
{
    /**
     * @var \\Magento\\Catalog\\Model\\ProductFactory
     */
    protected $catalogProductFactory;

    /**
     * @param \\Magento\\Catalog\\Model\\ProductFactory $catalogProductFactory
     */
    public function __construct(
        \\Magento\\Catalog\\Model\\ProductFactory $catalogProductFactory
    ) {
        $this->catalogProductFactory = $catalogProductFactory;
    }

    public function getProduct($id)
    {
        return $this->catalogProductFactory->create()->load($id);
    }
}
";
    let outcome = run(&processor(), source).unwrap();
    let report = outcome.report().cloned().unwrap();
    assert_eq!(outcome.tokens().render(), expected);

    assert_eq!(report.file, FileId::new("Test.php"));
    assert_eq!(report.invocations.len(), 1);
    let invocation = &report.invocations[0];
    assert_eq!(invocation.pattern, MagePattern::GetModel);
    assert_eq!(invocation.line, 6);
    assert_eq!(invocation.legacy, "Mage::getModel('catalog/product')");
    assert_eq!(invocation.modern, "$this->catalogProductFactory->create()");
    assert_eq!(
        report.requirements,
        vec![DiVariable::new(
            "catalogProductFactory",
            "\\Magento\\Catalog\\Model\\ProductFactory"
        )]
    );
}

#[test]
fn rewrite_without_requirement_stays_inside_its_span() {
    let constructor = "    public function __construct(Bar $bar)
    {
        $this->bar = $bar;
    }
";
    let source = format!(
        "<?php
class Foo
{{
{constructor}
    public function save()
    {{
        $this->addSuccess(Mage::helper('catalog')->__('Saved %1', $this->bar));
    }}
}}
"
    );
    let out = convert(&source);
    assert_eq!(
        out,
        source.replace("Mage::helper('catalog')->__(", "__(")
    );
    assert!(out.contains(constructor));
}

#[test]
fn one_parameter_and_one_assignment_per_requirement() {
    let source = "<?php
class Foo
{
    public function __construct(Bar $bar)
    {
        $this->bar = $bar;
    }

    public function isEnabled()
    {
        return Mage::getStoreConfigFlag('a/enabled') && Mage::getStoreConfig('a/mode') == 'x';
    }
}
";
    let out = convert(source);
    let ty = "\\Magento\\Framework\\App\\Config\\ScopeConfigInterface";
    assert_eq!(out.matches(&format!("{ty} $scopeConfig")).count(), 1, "{out}");
    assert_eq!(out.matches("$this->scopeConfig = $scopeConfig;").count(), 1);
    assert_eq!(out.matches("protected $scopeConfig;").count(), 1);
    assert!(out.contains(&format!("public function __construct(Bar $bar, {ty} $scopeConfig)")));
    assert!(out.contains(
        "return $this->scopeConfig->isSetFlag('a/enabled', \\Magento\\Store\\Model\\ScopeInterface::SCOPE_STORE) && $this->scopeConfig->getValue('a/mode', \\Magento\\Store\\Model\\ScopeInterface::SCOPE_STORE) == 'x';"
    ));
}

#[test]
fn later_requirement_wins_a_name_collision() {
    let outcome = run(&colliding_processor(), COLLIDING).unwrap();
    let report = outcome.report().cloned().unwrap();
    assert_eq!(
        report.requirements,
        vec![DiVariable::new("customerSession", "\\Acme\\Customer\\Session")]
    );

    let out = outcome.into_tokens().render();
    assert!(out.contains("\\Acme\\Customer\\Session $customerSession"));
    assert!(!out.contains("\\Magento\\Customer\\Model\\Session"));
    assert!(out.contains("$this->customerSession->logout();"));
    assert!(out.contains("$this->customerSession->start();"));
}

#[test]
fn reject_policy_fails_the_file_on_collision() {
    let processor = colliding_processor().with_policy(CollisionPolicy::Reject);
    let err = run(&processor, COLLIDING).unwrap_err();
    match &err {
        ProcessError::ConflictingRequirement {
            name,
            first,
            second,
            pattern,
            ..
        } => {
            assert_eq!(name, "customerSession");
            assert_eq!(first, "\\Magento\\Customer\\Model\\Session");
            assert_eq!(second, "\\Acme\\Customer\\Session");
            assert_eq!(*pattern, MagePattern::GetSingleton);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.file(), &FileId::new("Test.php"));
}

const MIXED: &str = "<?php
namespace Acme\\Sales;

class Observer extends \\Varien_Object
{
    protected $_data = [];

    public function __construct(
        array $data = []
    ) {
        parent::__construct($data);
    }

    public function handle($observer)
    {
        $order = Mage::getModel('sales/order')->load($observer->getId());
        if (!Mage::getStoreConfigFlag('sales/enabled', Mage::app()->getStore()->getId())) {
            Mage::throwException(Mage::helper('sales')->__('Disabled for %s', $order->getId()));
        }
        Mage::dispatchEvent('acme_order_seen', ['order' => $order]);
        Mage::register('acme_order', $order);
        Mage::log(sprintf('seen %d', $order->getId()));
        return Mage::helper('sales')->formatPrice(Mage::registry('amount'));
    }
}
";

#[test]
fn mixed_file_converts_to_balanced_relexable_code() {
    let outcome = run(&processor(), MIXED).unwrap();
    let report = outcome.report().cloned().unwrap();
    let out = outcome.into_tokens().render();

    assert!(!out.contains("Mage::"), "{out}");
    let stream = TokenStream::from_source(&out);
    assert!(stream.is_balanced());
    let (_, errors) = lex_with_errors(&out);
    assert_eq!(errors, vec![]);

    let names: Vec<&str> = report
        .requirements
        .iter()
        .map(|v| v.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "salesOrderFactory",
            "scopeConfig",
            "storeManager",
            "eventManager",
            "registry",
            "logger",
            "salesHelper",
        ]
    );
    assert!(out.contains(
        "        \\Psr\\Log\\LoggerInterface $logger,\n        \\Magento\\Sales\\Helper\\Data $salesHelper,\n        array $data = []\n    ) {"
    ), "{out}");
    assert!(out.contains(
        "        $this->salesHelper = $salesHelper;\n        parent::__construct($data);"
    ), "{out}");
}

#[test]
fn conversion_is_idempotent() {
    let processor = processor();
    for source in [MIXED, COLLIDING] {
        let once = run(&processor, source).unwrap().into_tokens().render();
        let twice = run(&processor, &once).unwrap().into_tokens().render();
        assert_eq!(twice, once);
    }
}

#[test]
fn abstract_constructor_is_reported_with_the_file() {
    let source = "<?php
abstract class Foo
{
    abstract public function __construct();

    public function run()
    {
        Mage::log('x');
    }
}
";
    let err = run(&processor(), source).unwrap_err();
    assert!(matches!(
        err,
        ProcessError::Inject {
            source: InjectError::MalformedConstructor { .. },
            ..
        }
    ));
    assert!(err.to_string().starts_with("Test.php: "));
}

#[test]
fn class_without_legacy_calls_round_trips() {
    let source = "<?php\nfinal class Clean\n{\n    public function x() { return 1; }\n}\n";
    let outcome = run(&processor(), source).unwrap();
    let report = outcome.report().cloned().unwrap();
    assert!(report.invocations.is_empty());
    assert!(report.requirements.is_empty());
    assert_eq!(outcome.into_tokens().render(), source);
}

#[test]
fn static_contexts_keep_calls_that_need_this() {
    let source = "<?php
class Foo
{
    public static function path()
    {
        if (!Mage::getStoreConfig('a/b')) {
            Mage::throwException('bad');
        }
    }

    public function run()
    {
        $log = static function () {
            Mage::log('x');
        };
        return Mage::registry('k');
    }
}
";
    let outcome = run(&processor(), source).unwrap();
    let report = outcome.report().cloned().unwrap();
    let patterns: Vec<_> = report.invocations.iter().map(|inv| inv.pattern).collect();
    assert_eq!(patterns, vec![MagePattern::ThrowException, MagePattern::Registry]);
    let names: Vec<_> = report.requirements.iter().map(|dep| dep.name.as_str()).collect();
    assert_eq!(names, vec!["registry"]);

    let out = outcome.into_tokens().render();
    assert!(out.contains("if (!Mage::getStoreConfig('a/b')) {"));
    assert!(out.contains("throw new \\Magento\\Framework\\Exception\\LocalizedException(__('bad'));"));
    assert!(out.contains("            Mage::log('x');"));
    assert!(out.contains("return $this->registry->registry('k');"));
    assert!(!out.contains("$this->scopeConfig"));
    assert!(!out.contains("$this->logger"));
}

proptest! {
    #[test]
    fn scripts_without_classes_are_untouched(body in "[a-zA-Z0-9_$:;()'\" \n>-]{0,120}") {
        prop_assume!(!body.to_ascii_lowercase().contains("class"));
        let source = format!("<?php {body}");
        let input = TokenStream::from_source(&source);
        let outcome = processor()
            .process(&FileId::new("p.php"), input.clone())
            .unwrap();
        let skipped = matches!(outcome, ProcessOutcome::Skipped { .. });
        prop_assert!(skipped);
        prop_assert_eq!(outcome.into_tokens(), input);
    }
}
