use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse direction of a mobile-money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Coming,
    Going,
    #[serde(rename = "No change")]
    NoChange,
    #[serde(rename = "Both ways")]
    BothWays,
    Unknown,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Coming => "Coming",
            Category::Going => "Going",
            Category::NoChange => "No change",
            Category::BothWays => "Both ways",
            Category::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "coming" => Ok(Category::Coming),
            "going" => Ok(Category::Going),
            "no change" => Ok(Category::NoChange),
            "both ways" => Ok(Category::BothWays),
            "unknown" => Ok(Category::Unknown),
            other => Err(format!("Unknown category: '{other}'")),
        }
    }
}

/// Fine-grained label within a [`Category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "Incoming Money")]
    IncomingMoney,
    #[serde(rename = "Transfers To Mobile Numbers")]
    MobileTransfer,
    #[serde(rename = "Payments to Code Holders")]
    CodeHolderPayment,
    #[serde(rename = "Bank Deposits")]
    BankDeposit,
    #[serde(rename = "Airtime Bill Payments")]
    AirtimePayment,
    #[serde(rename = "Cash Power Bill Payments")]
    CashPowerPayment,
    #[serde(rename = "Transactions Initiated by Third Parties")]
    ThirdPartyTransaction,
    #[serde(rename = "Withdrawals from Agents")]
    AgentWithdrawal,
    #[serde(rename = "Internet and Voice Bundle Purchases")]
    BundlePurchase,
    #[serde(rename = "Failed Transactions")]
    Failed,
    #[serde(rename = "Reversed Transactions")]
    Reversed,
    Unknown,
}

impl TransactionType {
    pub const ALL: [TransactionType; 12] = [
        TransactionType::IncomingMoney,
        TransactionType::MobileTransfer,
        TransactionType::CodeHolderPayment,
        TransactionType::BankDeposit,
        TransactionType::AirtimePayment,
        TransactionType::CashPowerPayment,
        TransactionType::ThirdPartyTransaction,
        TransactionType::AgentWithdrawal,
        TransactionType::BundlePurchase,
        TransactionType::Failed,
        TransactionType::Reversed,
        TransactionType::Unknown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TransactionType::IncomingMoney => "Incoming Money",
            TransactionType::MobileTransfer => "Transfers To Mobile Numbers",
            TransactionType::CodeHolderPayment => "Payments to Code Holders",
            TransactionType::BankDeposit => "Bank Deposits",
            TransactionType::AirtimePayment => "Airtime Bill Payments",
            TransactionType::CashPowerPayment => "Cash Power Bill Payments",
            TransactionType::ThirdPartyTransaction => "Transactions Initiated by Third Parties",
            TransactionType::AgentWithdrawal => "Withdrawals from Agents",
            TransactionType::BundlePurchase => "Internet and Voice Bundle Purchases",
            TransactionType::Failed => "Failed Transactions",
            TransactionType::Reversed => "Reversed Transactions",
            TransactionType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    /// Accepts the display label in any letter case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        TransactionType::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown transaction type: '{wanted}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_display_matches_labels() {
        assert_eq!(Category::NoChange.to_string(), "No change");
        assert_eq!(Category::BothWays.to_string(), "Both ways");
        assert_eq!(Category::Coming.to_string(), "Coming");
    }

    #[test]
    fn category_from_str_is_case_insensitive() {
        assert_eq!("going".parse::<Category>().unwrap(), Category::Going);
        assert_eq!("Both Ways".parse::<Category>().unwrap(), Category::BothWays);
        assert!("sideways".parse::<Category>().is_err());
    }

    #[test]
    fn transaction_type_labels_roundtrip() {
        for t in TransactionType::ALL {
            assert_eq!(t.label().parse::<TransactionType>().unwrap(), t);
        }
    }

    #[test]
    fn transaction_type_parses_lowercase_label() {
        assert_eq!(
            "withdrawals from agents".parse::<TransactionType>().unwrap(),
            TransactionType::AgentWithdrawal
        );
    }

    #[test]
    fn serde_uses_display_labels() {
        let json = serde_json::to_string(&TransactionType::BundlePurchase).unwrap();
        assert_eq!(json, "\"Internet and Voice Bundle Purchases\"");
        let back: Category = serde_json::from_str("\"No change\"").unwrap();
        assert_eq!(back, Category::NoChange);
    }
}
