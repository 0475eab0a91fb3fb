//! Reply dialects used by the carrier's confirmation messages.
//!
//! Amounts are matched either as grouped thousands (`210.000`, `1,250,000`)
//! or as a plain digit run; separators are stripped by the extractor.

use std::sync::LazyLock;

use regex::Regex;

const AMOUNT: &str = r"(\d{1,3}(?:[.,]\d{3})+|\d+)";

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("catalog pattern must compile")
}

/// `Ref 1: 1234 ... Ref 2: 5678`
pub static REF_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?is)ref\.?\s*1\s*:\s*([0-9a-z]+).*?ref\.?\s*2\s*:\s*([0-9a-z]+)")
});

/// `Nro. de transaccion: 123 ... Codigo: 456`
pub static TRANSACTION_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?is)transacci[oó]n\s*:?\s*(\d+).*?c[oó]digo(?:\s+de\s+retiro)?\s*:?\s*([0-9a-z]+)")
});

/// `Monto PYG 210.000. Ref. 999`
pub static AMOUNT_REF: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?is)monto\s*:?\s*(?:PYG|Gs\.?)?\s*{AMOUNT}\.?.*?ref\.?\s*:?\s*(\d+)"
    ))
});

/// `Importe: Gs. 55.000 ... Comprobante: 777`
pub static IMPORTE_RECEIPT: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?is)importe\s*:?\s*(?:PYG|Gs\.?)?\s*{AMOUNT}.*?comprobante\s*(?:nro\.?)?\s*:?\s*(\d+)"
    ))
});

/// `Saldo disponible: PYG 1.250.000. Ref. 42`
pub static BALANCE_REF: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?is)saldo(?:\s+disponible)?\s*:?\s*(?:PYG|Gs\.?)?\s*{AMOUNT}\.?.*?ref\.?\s*:?\s*(\d+)"
    ))
});

/// `Transaccion 123456 exitosa` / `Nro. de transaccion: 123456`
pub static TRANSACTION_ID: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)transacci[oó]n\s*(?:nro\.?|n[°º]|id)?\s*:?\s*(\d{4,})"));

/// `Ref: 123456` / `Referencia 123456`
pub static SINGLE_REF: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)ref(?:erencia)?\.?\s*:?\s*(\d{4,})"));
