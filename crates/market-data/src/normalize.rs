//! Normalization boundary from provider JSON into the fixed valuation types.
//!
//! Providers are inconsistent: a profile may arrive as an object or a
//! one-element array, numbers may be plain, quoted, or wrapped in Yahoo's
//! `{ "raw": .., "fmt": .. }` objects, and any field may be missing. Everything
//! is resolved here so formulas only ever see complete snapshots. Missing
//! numbers become `0.0`, a missing or non-positive beta becomes `DEFAULT_BETA`.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::collections::HashMap;
use valuation_core::{Bar, FinancialStatementSnapshot, MarketSnapshot, DEFAULT_BETA};

use crate::error::MarketDataError;

/// Treat an array as its items, an object as a single item, anything else as empty.
pub fn one_or_many(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().filter(|v| v.is_object()).collect(),
        Value::Object(_) => vec![value],
        _ => vec![],
    }
}

fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Object(map) => map.get("raw").and_then(number),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// First present numeric field among `keys`, else `0.0`.
pub fn num(obj: &Value, keys: &[&str]) -> f64 {
    opt_num(obj, keys).unwrap_or(0.0)
}

pub fn opt_num(obj: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| obj.get(*k).and_then(number))
}

pub fn text(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| {
        let v = obj.get(*k)?;
        let s = match v {
            Value::String(s) => s.trim().to_string(),
            Value::Object(map) => map.get("fmt")?.as_str()?.trim().to_string(),
            _ => return None,
        };
        (!s.is_empty()).then_some(s)
    })
}

fn beta_or_default(beta: Option<f64>) -> f64 {
    match beta {
        Some(b) if b > 0.0 => b,
        _ => DEFAULT_BETA,
    }
}

fn parse_day(date: &str) -> Option<DateTime<Utc>> {
    let day = NaiveDate::parse_from_str(date.get(..10)?, "%Y-%m-%d").ok()?;
    Some(day.and_hms_opt(0, 0, 0)?.and_utc())
}

fn fiscal_year_of(obj: &Value, date: &str) -> i32 {
    opt_num(obj, &["calendarYear", "fiscalYear"])
        .map(|y| y as i32)
        .or_else(|| date.get(..4).and_then(|y| y.parse().ok()))
        .unwrap_or(0)
}

fn finish_history(mut history: Vec<FinancialStatementSnapshot>, limit: usize) -> Vec<FinancialStatementSnapshot> {
    // ISO dates sort lexicographically
    history.sort_by(|a, b| b.fiscal_date.cmp(&a.fiscal_date));
    history.truncate(limit);
    history
}

// ============================================================================
// Financial Modeling Prep
// ============================================================================

/// `/profile/{symbol}` (object or one-element array) into a market snapshot.
pub fn fmp_market_snapshot(symbol: &str, profile: &Value) -> Result<MarketSnapshot, MarketDataError> {
    let p = one_or_many(profile)
        .into_iter()
        .next()
        .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

    let price = num(p, &["price"]);
    let market_cap = num(p, &["mktCap", "marketCap"]);
    let shares = match opt_num(p, &["sharesOutstanding"]) {
        Some(s) if s > 0.0 => s,
        _ if price > 0.0 => market_cap / price,
        _ => 0.0,
    };

    Ok(MarketSnapshot {
        symbol: text(p, &["symbol"]).unwrap_or_else(|| symbol.to_string()),
        name: text(p, &["companyName", "name"]),
        price,
        currency: text(p, &["currency"]).unwrap_or_else(|| "USD".to_string()),
        market_cap,
        beta: beta_or_default(opt_num(p, &["beta"])),
        sector: text(p, &["sector"]).unwrap_or_default(),
        industry: text(p, &["industry"]).unwrap_or_default(),
        dividend_per_share: num(p, &["lastDiv", "lastDividend"]),
        shares_outstanding: shares,
    })
}

fn by_date(value: &Value) -> HashMap<String, &Value> {
    one_or_many(value)
        .into_iter()
        .filter_map(|v| text(v, &["date"]).map(|d| (d, v)))
        .collect()
}

/// Join the three FMP annual statement lists on their `date` field.
///
/// The income statement drives the period list; balance sheet and cash flow
/// periods without a matching income period are dropped.
pub fn fmp_statements(
    income: &Value,
    balance: &Value,
    cash_flow: &Value,
    limit: usize,
) -> Vec<FinancialStatementSnapshot> {
    let balances = by_date(balance);
    let cash_flows = by_date(cash_flow);
    let empty = Value::Null;

    let history = one_or_many(income)
        .into_iter()
        .filter_map(|inc| {
            let date = text(inc, &["date"])?;
            let bs = balances.get(&date).copied().unwrap_or(&empty);
            let cf = cash_flows.get(&date).copied().unwrap_or(&empty);

            Some(FinancialStatementSnapshot {
                fiscal_year: fiscal_year_of(inc, &date),
                revenue: num(inc, &["revenue"]),
                cost_of_revenue: num(inc, &["costOfRevenue"]),
                gross_profit: num(inc, &["grossProfit"]),
                operating_income: num(inc, &["operatingIncome"]),
                net_income: num(inc, &["netIncome"]),
                eps: num(inc, &["epsdiluted", "epsDiluted", "eps"]),
                ebitda: num(inc, &["ebitda"]),
                cash: num(bs, &["cashAndCashEquivalents"]),
                short_term_investments: num(bs, &["shortTermInvestments"]),
                receivables: num(bs, &["netReceivables"]),
                inventory: num(bs, &["inventory"]),
                total_debt: num(bs, &["totalDebt"]),
                total_assets: num(bs, &["totalAssets"]),
                total_liabilities: num(bs, &["totalLiabilities"]),
                equity: num(bs, &["totalStockholdersEquity", "totalEquity"]),
                shares_outstanding: num(inc, &["weightedAverageShsOutDil", "weightedAverageShsOut"]),
                operating_cash_flow: num(cf, &["operatingCashFlow", "netCashProvidedByOperatingActivities"]),
                capex: num(cf, &["capitalExpenditure"]),
                free_cash_flow: num(cf, &["freeCashFlow"]),
                fiscal_date: date,
            })
        })
        .collect();

    finish_history(history, limit)
}

/// `/historical-price-full/{symbol}` (`{ historical: [...] }`) or a bare
/// array of daily rows into oldest-first bars.
pub fn fmp_bars(value: &Value) -> Vec<Bar> {
    let rows = match value.get("historical") {
        Some(h) => one_or_many(h),
        None => one_or_many(value),
    };

    let mut bars: Vec<Bar> = rows
        .into_iter()
        .filter_map(|row| {
            let timestamp = parse_day(&text(row, &["date"])?)?;
            let close = opt_num(row, &["close", "adjClose"])?;
            Some(Bar {
                timestamp,
                open: opt_num(row, &["open"]).unwrap_or(close),
                high: opt_num(row, &["high"]).unwrap_or(close),
                low: opt_num(row, &["low"]).unwrap_or(close),
                close,
                volume: num(row, &["volume"]),
            })
        })
        .collect();

    bars.sort_by_key(|b| b.timestamp);
    bars
}

// ============================================================================
// Yahoo Finance
// ============================================================================

fn quote_summary_result<'a>(symbol: &str, summary: &'a Value) -> Result<&'a Value, MarketDataError> {
    summary
        .get("quoteSummary")
        .and_then(|q| q.get("result"))
        .and_then(|r| one_or_many(r).into_iter().next())
        .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))
}

/// `quoteSummary` with the `price`, `summaryDetail`, `assetProfile` and
/// `defaultKeyStatistics` modules into a market snapshot.
pub fn yahoo_market_snapshot(symbol: &str, summary: &Value) -> Result<MarketSnapshot, MarketDataError> {
    let result = quote_summary_result(symbol, summary)?;
    let empty = Value::Null;
    let price_mod = result.get("price").unwrap_or(&empty);
    let detail = result.get("summaryDetail").unwrap_or(&empty);
    let profile = result.get("assetProfile").or_else(|| result.get("summaryProfile")).unwrap_or(&empty);
    let stats = result.get("defaultKeyStatistics").unwrap_or(&empty);

    let price = opt_num(price_mod, &["regularMarketPrice"])
        .or_else(|| opt_num(detail, &["regularMarketPreviousClose", "previousClose"]))
        .unwrap_or(0.0);
    if price <= 0.0 && price_mod.is_null() {
        return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
    }

    let market_cap = opt_num(price_mod, &["marketCap"])
        .or_else(|| opt_num(detail, &["marketCap"]))
        .unwrap_or(0.0);
    let shares = match opt_num(stats, &["sharesOutstanding"]) {
        Some(s) if s > 0.0 => s,
        _ if price > 0.0 => market_cap / price,
        _ => 0.0,
    };

    Ok(MarketSnapshot {
        symbol: text(price_mod, &["symbol"]).unwrap_or_else(|| symbol.to_string()),
        name: text(price_mod, &["longName", "shortName"]),
        price,
        currency: text(price_mod, &["currency"]).unwrap_or_else(|| "USD".to_string()),
        market_cap,
        beta: beta_or_default(opt_num(detail, &["beta"]).or_else(|| opt_num(stats, &["beta"]))),
        sector: text(profile, &["sector"]).unwrap_or_default(),
        industry: text(profile, &["industry"]).unwrap_or_default(),
        dividend_per_share: num(detail, &["dividendRate", "trailingAnnualDividendRate"]),
        shares_outstanding: shares,
    })
}

fn yahoo_rows<'a>(result: &'a Value, module: &str, list: &str) -> Vec<&'a Value> {
    result
        .get(module)
        .and_then(|m| m.get(list))
        .map(one_or_many)
        .unwrap_or_default()
}

fn yahoo_end_date(row: &Value) -> Option<String> {
    let end = row.get("endDate")?;
    if let Some(fmt) = text(row, &["endDate"]) {
        return Some(fmt);
    }
    let secs = number(end)? as i64;
    Some(DateTime::from_timestamp(secs, 0)?.format("%Y-%m-%d").to_string())
}

/// `quoteSummary` statement history modules into newest-first snapshots.
///
/// Yahoo reports no per-period share count, so `shares_outstanding` (the
/// current figure from `defaultKeyStatistics`) is applied to every period.
pub fn yahoo_statements(
    symbol: &str,
    summary: &Value,
    limit: usize,
) -> Result<Vec<FinancialStatementSnapshot>, MarketDataError> {
    let result = quote_summary_result(symbol, summary)?;
    let shares = result
        .get("defaultKeyStatistics")
        .and_then(|s| opt_num(s, &["sharesOutstanding"]))
        .unwrap_or(0.0);

    let balances: HashMap<String, &Value> = yahoo_rows(result, "balanceSheetHistory", "balanceSheetStatements")
        .into_iter()
        .filter_map(|r| yahoo_end_date(r).map(|d| (d, r)))
        .collect();
    let cash_flows: HashMap<String, &Value> = yahoo_rows(result, "cashflowStatementHistory", "cashflowStatements")
        .into_iter()
        .filter_map(|r| yahoo_end_date(r).map(|d| (d, r)))
        .collect();
    let empty = Value::Null;

    let history = yahoo_rows(result, "incomeStatementHistory", "incomeStatementHistory")
        .into_iter()
        .filter_map(|inc| {
            let date = yahoo_end_date(inc)?;
            let bs = balances.get(&date).copied().unwrap_or(&empty);
            let cf = cash_flows.get(&date).copied().unwrap_or(&empty);

            let operating_cash_flow = num(cf, &["totalCashFromOperatingActivities"]);
            let capex = num(cf, &["capitalExpenditures"]);
            let total_debt = num(bs, &["longTermDebt"]) + num(bs, &["shortLongTermDebt"]);

            Some(FinancialStatementSnapshot {
                fiscal_year: fiscal_year_of(inc, &date),
                revenue: num(inc, &["totalRevenue"]),
                cost_of_revenue: num(inc, &["costOfRevenue"]),
                gross_profit: num(inc, &["grossProfit"]),
                operating_income: num(inc, &["operatingIncome", "ebit"]),
                net_income: num(inc, &["netIncome", "netIncomeApplicableToCommonShares"]),
                eps: 0.0,
                ebitda: 0.0,
                cash: num(bs, &["cash"]),
                short_term_investments: num(bs, &["shortTermInvestments"]),
                receivables: num(bs, &["netReceivables"]),
                inventory: num(bs, &["inventory"]),
                total_debt,
                total_assets: num(bs, &["totalAssets"]),
                total_liabilities: num(bs, &["totalLiab"]),
                equity: num(bs, &["totalStockholderEquity"]),
                shares_outstanding: shares,
                operating_cash_flow,
                capex,
                free_cash_flow: 0.0,
                fiscal_date: date,
            })
        })
        .collect();

    Ok(finish_history(history, limit))
}

/// `v8/finance/chart` response into oldest-first bars; periods with any
/// null OHLC entry are skipped.
pub fn yahoo_bars(symbol: &str, chart: &Value) -> Result<Vec<Bar>, MarketDataError> {
    let result = chart
        .get("chart")
        .and_then(|c| c.get("result"))
        .and_then(|r| one_or_many(r).into_iter().next())
        .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

    let timestamps = match result.get("timestamp").and_then(Value::as_array) {
        Some(ts) => ts,
        None => return Ok(vec![]),
    };

    let quote = result
        .get("indicators")
        .and_then(|i| i.get("quote"))
        .and_then(|q| one_or_many(q).into_iter().next())
        .ok_or_else(|| MarketDataError::Decode("chart response has no quote indicators".to_string()))?;

    let series = |key: &str| -> Vec<Option<f64>> {
        quote
            .get(key)
            .and_then(Value::as_array)
            .map(|values| values.iter().map(number).collect())
            .unwrap_or_default()
    };
    let (opens, highs, lows, closes, volumes) =
        (series("open"), series("high"), series("low"), series("close"), series("volume"));
    let at = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

    let mut bars: Vec<Bar> = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            Some(Bar {
                timestamp: DateTime::from_timestamp(ts.as_i64()?, 0)?,
                open: at(&opens, i)?,
                high: at(&highs, i)?,
                low: at(&lows, i)?,
                close: at(&closes, i)?,
                volume: at(&volumes, i).unwrap_or(0.0),
            })
        })
        .collect();

    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}
