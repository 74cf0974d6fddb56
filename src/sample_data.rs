// src/sample_data.rs
use once_cell::sync::Lazy;

use crate::data_types::{CellValue, Row, TableData};

/// Built-in tables shown whenever no real source is reachable.
pub static SAMPLE_DATA: Lazy<TableData> = Lazy::new(|| {
    let mut data = TableData::new();

    data.insert(
        "Portfolio".to_string(),
        table(
            &["Symbol", "Price", "Change", "Volume"],
            vec![
                vec!["AAPL".into(), 185.92.into(), "+1.2%".into(), "52M".into()],
                vec!["MSFT".into(), 410.34.into(), "-0.4%".into(), "28M".into()],
                vec!["TSLA".into(), 175.05.into(), "+3.1%".into(), "105M".into()],
                vec!["GOOGL".into(), 154.22.into(), "+0.8%".into(), "19M".into()],
            ],
        ),
    );

    data.insert(
        "SYMBOLS_MASTER".to_string(),
        table(
            &["Symbol", "Name", "Sector", "Market Cap"],
            vec![
                vec!["NVDA".into(), "NVIDIA Corp".into(), "Technology".into(), "2.2T".into()],
                vec!["AMD".into(), "Advanced Micro Devices".into(), "Technology".into(), "310B".into()],
                vec!["AAPL".into(), "Apple Inc".into(), "Technology".into(), "2.8T".into()],
                vec!["MSFT".into(), "Microsoft Corp".into(), "Technology".into(), "3.1T".into()],
            ],
        ),
    );

    data.insert(
        "PRICE_DAILY".to_string(),
        table(
            &["Symbol", "open", "close", "Low", "High", "52w High"],
            vec![
                vec!["NVDA".into(), 820.50.into(), 850.10.into(), 818.00.into(), 855.00.into(), 974.00.into()],
                vec!["AMD".into(), 170.20.into(), 174.50.into(), 169.00.into(), 176.00.into(), 227.00.into()],
                vec!["AAPL".into(), 184.00.into(), 185.92.into(), 183.50.into(), 187.00.into(), 199.62.into()],
                vec!["MSFT".into(), 412.00.into(), 410.34.into(), 408.00.into(), 415.00.into(), 430.82.into()],
            ],
        ),
    );

    data.insert(
        "RESULTS_QUARTERLY".to_string(),
        table(
            &["Symbol", "Period", "Revenue", "Profit", "Margin"],
            vec![
                vec!["NVDA".into(), "Q1 24".into(), 26044.0.into(), 14881.0.into(), "57%".into()],
                vec!["NVDA".into(), "Q4 23".into(), 22103.0.into(), 12285.0.into(), "55%".into()],
                vec!["NVDA".into(), "Q3 23".into(), 18120.0.into(), 9243.0.into(), "51%".into()],
                vec!["AAPL".into(), "Q1 24".into(), 119575.0.into(), 33916.0.into(), "28%".into()],
                vec!["AAPL".into(), "Q4 23".into(), 89498.0.into(), 22956.0.into(), "25%".into()],
            ],
        ),
    );

    data.insert(
        "RESULTS_YEARLY".to_string(),
        table(
            &["Symbol", "Year", "Revenue", "Profit", "Margin"],
            vec![
                vec!["NVDA".into(), "2023".into(), 60922.0.into(), 29760.0.into(), "48%".into()],
                vec!["NVDA".into(), "2022".into(), 26974.0.into(), 4368.0.into(), "16%".into()],
                vec!["AAPL".into(), "2023".into(), 383285.0.into(), 96995.0.into(), "25%".into()],
                vec!["AAPL".into(), "2022".into(), 394328.0.into(), 99803.0.into(), "25%".into()],
            ],
        ),
    );

    data.insert(
        "Orders".to_string(),
        table(
            &["ID", "Item", "Quantity", "Status"],
            vec![
                vec!["1001".into(), "MacBook Pro".into(), 1.0.into(), "Delivered".into()],
                vec!["1002".into(), "iPhone 15".into(), 2.0.into(), "Processing".into()],
                vec!["1003".into(), "AirPods".into(), 5.0.into(), "Shipped".into()],
            ],
        ),
    );

    data
});

fn table(headers: &[&str], rows: Vec<Vec<CellValue>>) -> Vec<Row> {
    rows.into_iter()
        .map(|cells| headers.iter().copied().zip(cells).collect())
        .collect()
}
