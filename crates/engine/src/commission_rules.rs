//! Commission rules.
//!
//! A rule carries the settlement parameters for one commission type: today a
//! percentage of the gross, within a validity window. Applicability is
//! checked before any monetary computation, so a mismatched rule can never
//! half-settle a sale.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, Money, Percent, ResultEngine,
    agent_sales::{AgentSale, CommissionType},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasisType {
    Percentage,
}

impl BasisType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
        }
    }
}

impl TryFrom<&str> for BasisType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "percentage" => Ok(Self::Percentage),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid commission basis: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRule {
    pub id: Uuid,
    pub name: String,
    pub commission_type: CommissionType,
    pub basis: BasisType,
    /// Percentage of gross, e.g. "5" for a 5% commission.
    pub value: Percent,
    pub currency: Currency,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl CommissionRule {
    pub fn new(
        name: String,
        commission_type: CommissionType,
        basis: BasisType,
        value: Percent,
        currency: Currency,
        valid_from: DateTime<Utc>,
        valid_to: Option<DateTime<Utc>>,
    ) -> ResultEngine<Self> {
        if value.hundredths() < 0 || value.hundredths() > 10_000 {
            return Err(EngineError::InvalidAmount(
                "rule value must be between 0 and 100 percent".to_string(),
            ));
        }
        if let Some(to) = valid_to
            && to < valid_from
        {
            return Err(EngineError::InvalidAmount(
                "valid_to precedes valid_from".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            commission_type,
            basis,
            value,
            currency,
            valid_from,
            valid_to,
            is_active: true,
        })
    }

    /// Checks the rule against a sale.
    ///
    /// Type mismatch is detected first, so the caller can distinguish "wrong
    /// rule" from "right rule, wrong moment". The window check uses the
    /// sale's business date (`created_at`), not the confirmation instant.
    pub fn applies_to(&self, sale: &AgentSale) -> ResultEngine<()> {
        if self.commission_type != sale.commission_type {
            return Err(EngineError::CommissionTypeMismatch(format!(
                "rule {} settles {}, sale {} is {}",
                self.id,
                self.commission_type.as_str(),
                sale.id,
                sale.commission_type.as_str()
            )));
        }
        if !self.is_active {
            return Err(EngineError::RuleNotApplicable(format!(
                "rule {} is inactive",
                self.id
            )));
        }
        if sale.created_at < self.valid_from
            || self.valid_to.is_some_and(|to| sale.created_at > to)
        {
            return Err(EngineError::RuleNotApplicable(format!(
                "sale date {} outside rule {} validity window",
                sale.created_at, self.id
            )));
        }
        Ok(())
    }

    /// `gross × value / 100`, rounded half-up at the minor unit.
    #[must_use]
    pub fn commission_for(&self, gross: Money) -> Money {
        match self.basis {
            BasisType::Percentage => gross.percent_of(self.value),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "commission_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub commission_type: String,
    pub basis: String,
    pub value_hundredths: i64,
    pub currency: String,
    pub valid_from: DateTimeUtc,
    pub valid_to: Option<DateTimeUtc>,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CommissionRule> for ActiveModel {
    fn from(rule: &CommissionRule) -> Self {
        Self {
            id: ActiveValue::Set(rule.id.to_string()),
            name: ActiveValue::Set(rule.name.clone()),
            commission_type: ActiveValue::Set(rule.commission_type.as_str().to_string()),
            basis: ActiveValue::Set(rule.basis.as_str().to_string()),
            value_hundredths: ActiveValue::Set(rule.value.hundredths()),
            currency: ActiveValue::Set(rule.currency.code().to_string()),
            valid_from: ActiveValue::Set(rule.valid_from),
            valid_to: ActiveValue::Set(rule.valid_to),
            is_active: ActiveValue::Set(rule.is_active),
        }
    }
}

impl TryFrom<Model> for CommissionRule {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("rule not exists".to_string()))?,
            name: model.name,
            commission_type: CommissionType::try_from(model.commission_type.as_str())?,
            basis: BasisType::try_from(model.basis.as_str())?,
            value: Percent::from_hundredths(model.value_hundredths),
            currency: Currency::try_from(model.currency.as_str())?,
            valid_from: model.valid_from,
            valid_to: model.valid_to,
            is_active: model.is_active,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn rule(commission_type: CommissionType, value: &str) -> CommissionRule {
        CommissionRule::new(
            "standard".to_string(),
            commission_type,
            BasisType::Percentage,
            value.parse().unwrap(),
            Currency::default(),
            Utc::now() - TimeDelta::days(30),
            None,
        )
        .unwrap()
    }

    fn sale(commission_type: CommissionType) -> AgentSale {
        AgentSale::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            commission_type,
            None,
            Utc::now(),
        )
    }

    #[test]
    fn rejects_out_of_range_value() {
        let result = CommissionRule::new(
            "standard".to_string(),
            CommissionType::LicenseUse,
            BasisType::Percentage,
            "120".parse().unwrap(),
            Currency::default(),
            Utc::now(),
            None,
        );
        assert!(matches!(result, Err(EngineError::InvalidAmount(_))));
    }

    #[test]
    fn type_mismatch_beats_window_check() {
        // An expired rule of the wrong type reports the mismatch, not the
        // window.
        let mut rule = rule(CommissionType::LicenseUse, "5");
        rule.is_active = false;
        let sale = sale(CommissionType::PrincipalCommission);
        assert!(matches!(
            rule.applies_to(&sale),
            Err(EngineError::CommissionTypeMismatch(_))
        ));
    }

    #[test]
    fn inactive_rule_is_not_applicable() {
        let mut rule = rule(CommissionType::LicenseUse, "5");
        rule.is_active = false;
        let sale = sale(CommissionType::LicenseUse);
        assert!(matches!(
            rule.applies_to(&sale),
            Err(EngineError::RuleNotApplicable(_))
        ));
    }

    #[test]
    fn sale_outside_window_is_not_applicable() {
        let mut rule = rule(CommissionType::LicenseUse, "5");
        rule.valid_to = Some(Utc::now() - TimeDelta::days(1));
        let sale = sale(CommissionType::LicenseUse);
        assert!(matches!(
            rule.applies_to(&sale),
            Err(EngineError::RuleNotApplicable(_))
        ));
    }

    #[test]
    fn matching_rule_applies() {
        let rule = rule(CommissionType::PrincipalCommission, "5");
        let sale = sale(CommissionType::PrincipalCommission);
        assert!(rule.applies_to(&sale).is_ok());
    }

    #[test]
    fn currency_survives_the_model_round_trip() {
        let rule = rule(CommissionType::LicenseUse, "5");
        assert_eq!(rule.currency, Currency::Usd);

        let model = Model {
            id: rule.id.to_string(),
            name: rule.name.clone(),
            commission_type: rule.commission_type.as_str().to_string(),
            basis: rule.basis.as_str().to_string(),
            value_hundredths: rule.value.hundredths(),
            currency: "EUR".to_string(),
            valid_from: rule.valid_from,
            valid_to: rule.valid_to,
            is_active: rule.is_active,
        };
        let restored = CommissionRule::try_from(model.clone()).unwrap();
        assert_eq!(restored.currency, Currency::Eur);

        let unknown = Model {
            currency: "BTC".to_string(),
            ..model
        };
        assert!(CommissionRule::try_from(unknown).is_err());
    }

    #[test]
    fn commission_is_percentage_of_gross() {
        let rule = rule(CommissionType::PrincipalCommission, "5");
        let gross: Money = "1000.00".parse().unwrap();
        assert_eq!(rule.commission_for(gross).to_string(), "50.00");
    }
}
