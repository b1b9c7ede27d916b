use momo_core::{Category, TransactionType};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// The canonical vendor rule table, evaluated top to bottom.
///
/// Order matters: "payment" must win over "agent", and "received" over
/// everything else.
pub const DEFAULT_RULES: &[(&str, &[&str], Category, TransactionType)] = &[
    (
        "incoming",
        &["received"],
        Category::Coming,
        TransactionType::IncomingMoney,
    ),
    (
        "transfer",
        &["transferred"],
        Category::Going,
        TransactionType::MobileTransfer,
    ),
    (
        "payment",
        &["payment"],
        Category::Going,
        TransactionType::CodeHolderPayment,
    ),
    (
        "bank_deposit",
        &["bank deposit"],
        Category::Coming,
        TransactionType::BankDeposit,
    ),
    (
        "airtime",
        &["to airtime"],
        Category::Going,
        TransactionType::AirtimePayment,
    ),
    (
        "cash_power",
        &["cash power"],
        Category::Going,
        TransactionType::CashPowerPayment,
    ),
    (
        "third_party",
        &["a transaction of"],
        Category::Going,
        TransactionType::ThirdPartyTransaction,
    ),
    (
        "agent_withdrawal",
        &["agent"],
        Category::Going,
        TransactionType::AgentWithdrawal,
    ),
    (
        "bundle",
        &["kugura", "bundle"],
        Category::Going,
        TransactionType::BundlePurchase,
    ),
    (
        "failed",
        &["failed"],
        Category::NoChange,
        TransactionType::Failed,
    ),
    (
        "reversed",
        &["reversed", "reversal"],
        Category::BothWays,
        TransactionType::Reversed,
    ),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationRule {
    pub name: String,
    /// Matches when the message contains any of these, ignoring case.
    pub keywords: Vec<String>,
    pub category: Category,
    pub transaction_type: TransactionType,
}

impl ClassificationRule {
    pub fn new(
        name: &str,
        keywords: &[&str],
        category: Category,
        transaction_type: TransactionType,
    ) -> Self {
        ClassificationRule {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            category,
            transaction_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: Category,
    pub transaction_type: TransactionType,
}

impl Classification {
    pub const UNKNOWN: Classification = Classification {
        category: Category::Unknown,
        transaction_type: TransactionType::Unknown,
    };

    pub fn is_unknown(self) -> bool {
        self.category == Category::Unknown
    }
}

#[derive(Deserialize)]
struct RuleFile {
    rules: Vec<ClassificationRule>,
}

/// A rule with its keywords lowercased once up front.
#[derive(Debug, Clone)]
struct CompiledRule {
    rule: ClassificationRule,
    needles: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<CompiledRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_RULES
                .iter()
                .map(|(name, keywords, category, tx_type)| {
                    ClassificationRule::new(name, keywords, *category, *tx_type)
                })
                .collect(),
        )
    }
}

impl Classifier {
    /// Rules are kept in the given order; the first match wins.
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let needles = rule
                    .keywords
                    .iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                CompiledRule { rule, needles }
            })
            .collect();
        Self { rules }
    }

    /// Loads an ordered `[[rules]]` table, e.g.
    ///
    /// ```toml
    /// [[rules]]
    /// name = "incoming"
    /// keywords = ["received"]
    /// category = "Coming"
    /// transaction_type = "Incoming Money"
    /// ```
    pub fn from_toml(toml_content: &str) -> Result<Self, String> {
        let file: RuleFile =
            toml::from_str(toml_content).map_err(|e| format!("Failed to parse TOML: {e}"))?;
        Ok(Self::new(file.rules))
    }

    pub fn find_matching_rule(&self, message: &str) -> Option<&ClassificationRule> {
        let text = message.to_lowercase();
        self.rules
            .iter()
            .find(|cr| cr.needles.iter().any(|n| text.contains(n.as_str())))
            .map(|cr| &cr.rule)
    }

    /// Total over any input: messages no rule recognises are `Unknown`.
    pub fn classify(&self, message: &str) -> Classification {
        self.find_matching_rule(message)
            .map(|rule| Classification {
                category: rule.category,
                transaction_type: rule.transaction_type,
            })
            .unwrap_or(Classification::UNKNOWN)
    }
}

/// Classifies with the default rule table.
pub fn classify(message: &str) -> Classification {
    static DEFAULT: OnceLock<Classifier> = OnceLock::new();
    DEFAULT.get_or_init(Classifier::default).classify(message)
}
