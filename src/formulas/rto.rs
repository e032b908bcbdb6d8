//! COD / RTO profitability
//!
//! Expected-value model: each order independently fails delivery with the
//! RTO probability of its payment mode. Correlation between orders and the
//! variance of outcomes are not modelled.

use serde::{Deserialize, Serialize};

use super::{pct, ratio};
use crate::input::{clamp_percent, finite_or_zero};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtoInput {
    /// Average selling price
    pub asp: f64,
    pub cogs: f64,
    pub forward_shipping: f64,
    pub reverse_shipping: f64,
    /// Flat fee charged per cash-on-delivery order
    pub cod_fee: f64,
    /// Gateway fee as % of ASP (prepaid orders only)
    pub gateway_percent: f64,
    /// Share of orders paid upfront, %
    pub prepaid_share: f64,
    pub rto_prepaid: f64,
    pub rto_cod: f64,
}

impl Default for RtoInput {
    fn default() -> Self {
        Self {
            asp: 1500.0,
            cogs: 500.0,
            forward_shipping: 70.0,
            reverse_shipping: 60.0,
            cod_fee: 40.0,
            gateway_percent: 2.0,
            prepaid_share: 40.0,
            rto_prepaid: 5.0,
            rto_cod: 25.0,
        }
    }
}

/// Outcome economics for one payment mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentModeEconomics {
    /// Share of orders using this mode, %
    pub share: f64,
    /// Profit when the order is delivered
    pub success_margin: f64,
    /// Loss when the order returns to origin
    pub fail_cost: f64,
    /// Probability-weighted profit per order
    pub weighted_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtoMetrics {
    pub gateway_fee: f64,
    pub prepaid: PaymentModeEconomics,
    pub cod: PaymentModeEconomics,
    /// Expected profit per order across the payment mix
    pub blended_profit: f64,
    /// Profit lost versus a no-RTO, no-fee baseline of `asp - cogs`
    pub rto_loss_impact: f64,
    /// Blended profit as % of ASP
    pub net_realization_pct: f64,
}

pub fn calculate(input: &RtoInput) -> RtoMetrics {
    let prepaid_share = input.prepaid_share;
    let cod_share = 100.0 - prepaid_share;

    let gateway_fee = input.asp * pct(input.gateway_percent);

    let prepaid_success = input.asp - input.cogs - input.forward_shipping - gateway_fee;
    let prepaid_fail = input.forward_shipping + input.reverse_shipping + gateway_fee;
    let prepaid = weigh(prepaid_share, prepaid_success, prepaid_fail, input.rto_prepaid);

    let cod_success = input.asp - input.cogs - input.forward_shipping - input.cod_fee;
    let cod_fail = input.forward_shipping + input.reverse_shipping;
    let cod = weigh(cod_share, cod_success, cod_fail, input.rto_cod);

    let blended_profit =
        pct(prepaid_share) * prepaid.weighted_profit + pct(cod_share) * cod.weighted_profit;
    let rto_loss_impact = (input.asp - input.cogs) - blended_profit;

    RtoMetrics {
        gateway_fee,
        prepaid,
        cod,
        blended_profit,
        rto_loss_impact,
        net_realization_pct: ratio(blended_profit, input.asp) * 100.0,
    }
}

fn weigh(share: f64, success_margin: f64, fail_cost: f64, rto_pct: f64) -> PaymentModeEconomics {
    let rto = pct(rto_pct);
    PaymentModeEconomics {
        share,
        success_margin,
        fail_cost,
        weighted_profit: (1.0 - rto) * success_margin - rto * fail_cost,
    }
}

/// Gateway charges on a single transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementQuote {
    pub fees: f64,
    pub net_settlement: f64,
    /// Fees as % of transaction value
    pub effective_rate_pct: f64,
}

/// Quote gateway fees for one transaction: percentage rate plus flat fee
pub fn settlement(transaction_value: f64, rate_pct: f64, flat_fee: f64) -> SettlementQuote {
    let transaction_value = finite_or_zero(transaction_value);
    let rate_pct = clamp_percent(rate_pct);
    let flat_fee = finite_or_zero(flat_fee);
    let fees = transaction_value * pct(rate_pct) + flat_fee;
    SettlementQuote {
        fees,
        net_settlement: transaction_value - fees,
        effective_rate_pct: ratio(fees, transaction_value) * 100.0,
    }
}
