use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::Dividend;

/// Column chart input: one category per dividend year.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSeries {
    pub title: &'static str,
    pub name: &'static str,
    pub categories: Vec<i32>,
    #[serde(with = "decimal_list")]
    pub data: Vec<Decimal>,
}

/// Donut chart input: one labelled slice per dividend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonutSeries {
    pub title: &'static str,
    pub name: &'static str,
    pub data: Vec<DonutPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonutPoint {
    pub name: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub y: Decimal,
}

/// Annual dividend amount, in the order the dividends are held.
pub fn annual_amounts(dividends: &[Dividend]) -> ColumnSeries {
    ColumnSeries {
        title: "Annual Dividend Amount",
        name: "Dividend Amount",
        categories: dividends.iter().map(|dividend| dividend.year).collect(),
        data: dividends
            .iter()
            .map(|dividend| dividend.dividend_amount)
            .collect(),
    }
}

/// Share of dividend yield per year.
pub fn yield_share(dividends: &[Dividend]) -> DonutSeries {
    DonutSeries {
        title: "Dividend Yield Percentage",
        name: "Dividend Yield",
        data: dividends
            .iter()
            .map(|dividend| DonutPoint {
                name: dividend.year.to_string(),
                y: dividend.dividend_yield,
            })
            .collect(),
    }
}

mod decimal_list {
    use rust_decimal::Decimal;
    use serde::ser::{SerializeSeq, Serializer};

    pub fn serialize<S>(values: &[Decimal], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&Exact(value))?;
        }
        seq.end()
    }

    struct Exact<'a>(&'a Decimal);

    impl serde::Serialize for Exact<'_> {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            rust_decimal::serde::arbitrary_precision::serialize(self.0, serializer)
        }
    }
}
