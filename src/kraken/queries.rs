//! The fixed GraphQL document set and reading date windows

use chrono::{Datelike, Duration, NaiveDate};

pub const LOGIN_MUTATION: &str = r#"
mutation obtainKrakenToken($input: ObtainJSONWebTokenInput!) {
  obtainKrakenToken(input: $input) {
    token
  }
}
"#;

pub const ACCOUNTS_QUERY: &str = r#"
query getAccounts {
  viewer {
    accounts {
      number
      status
      ledgers {
        balance
        ledgerType
        name
        number
      }
    }
  }
}
"#;

pub const ACCOUNT_DATA_QUERY: &str = r#"
query getAccountData($accountNumber: String!) {
  account(accountNumber: $accountNumber) {
    id
    number
    status
    ledgers {
      balance
      ledgerType
      name
      number
    }
    creditStorage {
      ledger {
        currentBalance
        ledgerType
        name
        number
      }
    }
    properties {
      address
      supplyPoints(first: 10) {
        edges {
          node {
            externalIdentifier
            meterPoint {
              __typename
              ... on ElectricityMeterPoint {
                id
                distributorStatus
                meterKind
                subscribedMaxPower
                isTeleoperable
                offPeakLabel
                poweredStatus
                providerCalendarId
                providerCalendarName
                address {
                  fullAddress
                }
              }
              ... on GasMeterPoint {
                id
                distributorStatus
                gasNature
                annualConsumption
                isSmartMeter
                poweredStatus
                priceLevel
                tariffOption
                address {
                  fullAddress
                }
              }
            }
          }
        }
      }
    }
  }
  agreements(accountNumber: $accountNumber, first: 10) {
    edges {
      node {
        id
        isActive
        validFrom
        validTo
        supplyPoint {
          externalIdentifier
        }
        chargingLedger {
          ledgerType
          number
        }
        product {
          code
          displayName
        }
        energySupplyRate {
          standingCharge {
            pricePerUnit
            pricePerUnitWithTaxes
            period
          }
          consumptionRates {
            pricePerUnit
            pricePerUnitWithTaxes
            providerCalendar
            priceLevel
          }
        }
      }
    }
  }
}
"#;

pub const ELECTRICITY_READINGS_QUERY: &str = r#"
query electricityReadings($accountNumber: String!, $prmId: String!, $dateFrom: Date!, $dateTo: Date!, $frequency: ReadingFrequency!) {
  electricityReading(
    accountNumber: $accountNumber
    prmId: $prmId
    dateFrom: $dateFrom
    dateTo: $dateTo
    frequency: $frequency
    calendarType: PROVIDER
  ) {
    edges {
      node {
        indexStartValue
        indexEndValue
        calendarTempClass
        consumption
        consumptionReliability
        statusProcessed
        periodStartAt
        periodEndAt
      }
    }
  }
}
"#;

pub const GAS_READINGS_QUERY: &str = r#"
query gasReadings($accountNumber: String!, $pceRef: String!, $dateFrom: Date!, $dateTo: Date!, $frequency: ReadingFrequency!) {
  gasReading(
    accountNumber: $accountNumber
    pceRef: $pceRef
    dateFrom: $dateFrom
    dateTo: $dateTo
    frequency: $frequency
  ) {
    edges {
      node {
        consumption
        indexStartValue
        indexEndValue
        periodStartAt
        periodEndAt
        readingDate
        readingType
        statusProcessed
      }
    }
  }
}
"#;

pub const ELECTRICITY_INDEX_QUERY: &str = r#"
query electricityIndex($accountNumber: String!, $prmId: String!) {
  electricityReading(
    accountNumber: $accountNumber
    prmId: $prmId
    first: 10
    calendarType: PROVIDER
    statusProcessed: OK
  ) {
    edges {
      node {
        indexStartValue
        indexEndValue
        calendarTempClass
        consumption
        statusProcessed
        periodStartAt
        periodEndAt
      }
    }
  }
}
"#;

pub const PAYMENT_REQUEST_QUERY: &str = r#"
query paymentRequest($ledgerNumber: String!) {
  paymentRequests(ledgerNumber: $ledgerNumber) {
    paymentRequest(first: 1) {
      edges {
        node {
          paymentStatus
          totalAmount
          customerAmount
          expectedPaymentDate
        }
      }
    }
  }
}
"#;

/// Query documents handed to the client at construction
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySet {
    pub login: String,
    pub accounts: String,
    pub account_data: String,
    pub electricity_readings: String,
    pub gas_readings: String,
    pub electricity_index: String,
    pub payment_request: String,
}

impl Default for QuerySet {
    fn default() -> Self {
        Self {
            login: LOGIN_MUTATION.to_string(),
            accounts: ACCOUNTS_QUERY.to_string(),
            account_data: ACCOUNT_DATA_QUERY.to_string(),
            electricity_readings: ELECTRICITY_READINGS_QUERY.to_string(),
            gas_readings: GAS_READINGS_QUERY.to_string(),
            electricity_index: ELECTRICITY_INDEX_QUERY.to_string(),
            payment_request: PAYMENT_REQUEST_QUERY.to_string(),
        }
    }
}

/// Reading aggregation requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingFrequency {
    Daily,
    Monthly,
}

impl ReadingFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Monthly => "MONTHLY",
        }
    }
}

/// Inclusive date range of a readings query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub frequency: ReadingFrequency,
}

impl ReadingWindow {
    /// First day of the current month through tomorrow, daily
    pub fn electricity(today: NaiveDate) -> Self {
        Self {
            from: today.with_day(1).unwrap_or(today),
            to: today + Duration::days(1),
            frequency: ReadingFrequency::Daily,
        }
    }

    /// 365 days back through tomorrow, monthly
    pub fn gas(today: NaiveDate) -> Self {
        Self {
            from: today - Duration::days(365),
            to: today + Duration::days(1),
            frequency: ReadingFrequency::Monthly,
        }
    }

    pub fn date_from(&self) -> String {
        self.from.format("%Y-%m-%d").to_string()
    }

    pub fn date_to(&self) -> String {
        self.to.format("%Y-%m-%d").to_string()
    }
}
