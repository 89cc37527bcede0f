//! Bank/fintech alias table (C13).
//!
//! Read-only at runtime — picking up an addition means a config reload,
//! not a code change (§9 alias-table-growth note). Keyed by lowercase
//! alias strings with no internal whitespace; `enrichBankInfo` strips
//! whitespace from its candidate substrings before lookup.

use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BankInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub domains: &'static [&'static str],
}

macro_rules! bank {
    ($code:expr, $name:expr, $category:expr, [$($domain:expr),* $(,)?]) => {
        BankInfo { code: $code, name: $name, category: $category, domains: &[$($domain),*] }
    };
}

/// Alias → BankInfo. Multiple aliases may map to the same bank.
pub static BANK_ALIASES: Lazy<HashMap<&'static str, BankInfo>> = Lazy::new(|| {
    let mut m = HashMap::new();

    let mut insert = |aliases: &[&'static str], info: BankInfo| {
        for alias in aliases {
            m.insert(*alias, info.clone());
        }
    };

    // ── Commercial banks ────────────────────────────────────────────
    insert(
        &["access", "accessbank"],
        bank!("ACC", "Access Bank", "commercial", ["accessbankplc.com"]),
    );
    insert(
        &["gtb", "gtbank", "guaranty"],
        bank!("GTB", "Guaranty Trust Bank", "commercial", ["gtbank.com"]),
    );
    insert(
        &["firstbank", "fbn"],
        bank!("FBN", "First Bank of Nigeria", "commercial", ["firstbanknigeria.com"]),
    );
    insert(
        &["zenith", "zenithbank"],
        bank!("ZEN", "Zenith Bank", "commercial", ["zenithbank.com"]),
    );
    insert(
        &["uba", "unitedbank"],
        bank!("UBA", "United Bank for Africa", "commercial", ["ubagroup.com"]),
    );
    insert(&["fcmb"], bank!("FCMB", "First City Monument Bank", "commercial", ["fcmb.com"]));
    insert(&["fidelity", "fidelitybank"], bank!("FID", "Fidelity Bank", "commercial", ["fidelitybank.ng"]));
    insert(&["stanbic", "stanbicibtc"], bank!("STN", "Stanbic IBTC Bank", "commercial", ["stanbicibtcbank.com"]));
    insert(&["sterling", "sterlingbank"], bank!("STL", "Sterling Bank", "commercial", ["sterling.ng"]));
    insert(&["union", "unionbank"], bank!("UNI", "Union Bank", "commercial", ["unionbankng.com"]));
    insert(&["wema", "wemabank"], bank!("WEM", "Wema Bank", "commercial", ["wemabank.com"]));
    insert(&["ecobank"], bank!("ECO", "Ecobank", "commercial", ["ecobank.com"]));
    insert(&["polaris", "polarisbank"], bank!("POL", "Polaris Bank", "commercial", ["polarisbanklimited.com"]));
    insert(&["keystone", "keystonebank"], bank!("KEY", "Keystone Bank", "commercial", ["keystonebankng.com"]));
    insert(&["heritage", "heritagebank"], bank!("HER", "Heritage Bank", "commercial", ["hbng.com"]));
    insert(&["providus", "providusbank"], bank!("PRV", "Providus Bank", "commercial", ["providusbank.com"]));

    // ── Non-interest banks ────────────────────────────────────────────
    insert(&["jaiz", "jaizbank"], bank!("JAIZ", "Jaiz Bank", "non_interest", ["jaizbankplc.com"]));
    insert(&["taj", "tajbank"], bank!("TAJ", "TAJBank", "non_interest", ["tajbank.com"]));

    // ── Fintech ────────────────────────────────────────────────────────
    insert(&["opay"], bank!("OPAY", "OPay", "fintech", ["opayweb.com"]));
    insert(&["palmpay"], bank!("PALM", "PalmPay", "fintech", ["palmpay.com"]));
    insert(&["kuda", "kudabank"], bank!("KUDA", "Kuda Bank", "fintech", ["kuda.com"]));
    insert(&["moniepoint"], bank!("MONI", "Moniepoint", "fintech", ["moniepoint.com"]));
    insert(&["paystack"], bank!("PSTK", "Paystack", "fintech", ["paystack.com"]));
    insert(&["flutterwave"], bank!("FLW", "Flutterwave", "fintech", ["flutterwave.com"]));
    insert(&["carbon"], bank!("CARB", "Carbon", "fintech", ["getcarbon.co"]));
    insert(&["piggyvest"], bank!("PIGGY", "PiggyVest", "fintech", ["piggyvest.com"]));

    // ── Microfinance ───────────────────────────────────────────────────
    insert(&["vfd", "vfdmfb"], bank!("VFD", "VFD Microfinance Bank", "microfinance", ["vfdgroup.com"]));
    insert(&["alat"], bank!("ALAT", "ALAT by Wema", "microfinance", ["alat.ng"]));

    // ── Holding companies ───────────────────────────────────────────────
    insert(&["fbnholdings", "fbnh"], bank!("FBNH", "FBN Holdings", "holding", ["fbnholdings.com"]));
    insert(&["gtco"], bank!("GTCO", "Guaranty Trust Holding Company", "holding", ["gtcoplc.com"]));

    // ── Development finance institutions ───────────────────────────────
    insert(&["boi"], bank!("BOI", "Bank of Industry", "dfi", ["boi.ng"]));
    insert(&["bankofagriculture", "boa"], bank!("BOA", "Bank of Agriculture", "dfi", ["boanigeria.com"]));

    m
});

pub fn lookup(alias: &str) -> Option<&'static BankInfo> {
    BANK_ALIASES.get(alias)
}
