//! Report service facade.
//!
//! The only surface an external transport shim touches. Every operation
//! validates its parameters first, then acquires one execution handle,
//! runs one report, and releases the handle on every exit path (the guard
//! drops when the call returns). Operations are stateless and independent;
//! concurrent requests need no coordination.

use crate::error::{Error, Result};
use crate::pool::ConnectionProvider;
use crate::reports::{customers, employees, products, purchasing, sales, segment, timeseries};
use crate::reports::{Fact, TOP_N};

/// All report operations behind validated parameters.
#[derive(Clone)]
pub struct ReportService<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> ReportService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    // ------------------------------------------------------------------
    // Sales performance
    // ------------------------------------------------------------------

    pub async fn sales_kpi(&self) -> Result<sales::SalesKpi> {
        let conn = self.provider.get().await?;
        sales::kpi(&conn).await
    }

    pub async fn top_products(&self) -> Result<Vec<products::ProductSales>> {
        let conn = self.provider.get().await?;
        sales::top_products(&conn).await
    }

    pub async fn discount_impact(&self) -> Result<Vec<sales::DiscountImpact>> {
        let conn = self.provider.get().await?;
        sales::discount_impact(&conn).await
    }

    pub async fn monthly_revenue(&self) -> Result<Vec<sales::MonthlyRevenue>> {
        let conn = self.provider.get().await?;
        sales::monthly_revenue(&conn).await
    }

    // ------------------------------------------------------------------
    // Customer analytics
    // ------------------------------------------------------------------

    pub async fn top_customers(&self) -> Result<Vec<customers::CustomerSales>> {
        let conn = self.provider.get().await?;
        customers::top_customers(&conn).await
    }

    pub async fn customer_segments(
        &self,
        sort: customers::SegmentSort,
    ) -> Result<Vec<customers::SegmentBreakdown>> {
        let conn = self.provider.get().await?;
        customers::segments(&conn, sort).await
    }

    pub async fn customer_trend(&self) -> Result<Vec<segment::CustomerTrend>> {
        let conn = self.provider.get().await?;
        segment::customer_trend(&conn).await
    }

    // ------------------------------------------------------------------
    // Product analytics
    // ------------------------------------------------------------------

    pub async fn most_sold_products(&self) -> Result<Vec<products::ProductSales>> {
        let conn = self.provider.get().await?;
        products::most_sold(&conn).await
    }

    pub async fn least_sold_products(&self) -> Result<Vec<products::ProductSales>> {
        let conn = self.provider.get().await?;
        products::least_sold(&conn).await
    }

    pub async fn top_discounted_products(&self) -> Result<Vec<products::DiscountedProduct>> {
        let conn = self.provider.get().await?;
        products::top_discounted(&conn).await
    }

    // ------------------------------------------------------------------
    // Employee analytics
    // ------------------------------------------------------------------

    pub async fn employee_performance(&self) -> Result<Vec<employees::EmployeePerformance>> {
        let conn = self.provider.get().await?;
        employees::performance(&conn).await
    }

    pub async fn top_product_per_employee(&self) -> Result<Vec<employees::EmployeeProductSales>> {
        let conn = self.provider.get().await?;
        employees::top_product_per_employee(&conn).await
    }

    pub async fn employee_monthly_trend(&self) -> Result<Vec<employees::EmployeeMonthlySales>> {
        let conn = self.provider.get().await?;
        employees::monthly_trend(&conn).await
    }

    // ------------------------------------------------------------------
    // Time-series drill-down (sales and purchasing)
    // ------------------------------------------------------------------

    pub async fn sales_years(&self) -> Result<Vec<i32>> {
        let conn = self.provider.get().await?;
        timeseries::years(&conn, Fact::Sales).await
    }

    /// Monthly revenue for one year; defaults to the current calendar year.
    pub async fn sales_monthly(
        &self,
        year: Option<i32>,
    ) -> Result<Vec<timeseries::MonthlyRevenue>> {
        let year = year.unwrap_or_else(timeseries::current_year);
        let conn = self.provider.get().await?;
        timeseries::monthly(&conn, Fact::Sales, year).await
    }

    /// Weekly revenue within one month. Both scope parameters are
    /// required; their absence is a caller error and no query is attempted.
    pub async fn sales_weekly(
        &self,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<Vec<timeseries::WeeklyRevenue>> {
        let (year, month) = validate_weekly(year, month)?;
        let conn = self.provider.get().await?;
        timeseries::weekly(&conn, Fact::Sales, year, month).await
    }

    pub async fn weekend_vs_weekday(&self) -> Result<Vec<timeseries::DayTypeSales>> {
        let conn = self.provider.get().await?;
        timeseries::weekend_vs_weekday(&conn).await
    }

    pub async fn month_effectiveness(&self) -> Result<Vec<timeseries::MonthEffectiveness>> {
        let conn = self.provider.get().await?;
        timeseries::month_effectiveness(&conn).await
    }

    // ------------------------------------------------------------------
    // Purchasing analytics
    // ------------------------------------------------------------------

    pub async fn purchasing_kpi(&self) -> Result<purchasing::PurchasingKpi> {
        let conn = self.provider.get().await?;
        purchasing::kpi(&conn).await
    }

    pub async fn top_purchased_products(&self) -> Result<Vec<purchasing::PurchasedProduct>> {
        let conn = self.provider.get().await?;
        purchasing::top_products(&conn).await
    }

    pub async fn top_suppliers(&self) -> Result<Vec<purchasing::SupplierPurchases>> {
        let conn = self.provider.get().await?;
        purchasing::top_suppliers(&conn).await
    }

    pub async fn most_rejected_products(&self) -> Result<Vec<purchasing::RejectedProduct>> {
        let conn = self.provider.get().await?;
        purchasing::most_rejected(&conn).await
    }

    pub async fn purchasing_years(&self) -> Result<Vec<i32>> {
        let conn = self.provider.get().await?;
        timeseries::years(&conn, Fact::Purchasing).await
    }

    pub async fn purchasing_monthly(
        &self,
        year: Option<i32>,
    ) -> Result<Vec<timeseries::MonthlyRevenue>> {
        let year = year.unwrap_or_else(timeseries::current_year);
        let conn = self.provider.get().await?;
        timeseries::monthly(&conn, Fact::Purchasing, year).await
    }

    pub async fn purchasing_weekly(
        &self,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<Vec<timeseries::WeeklyRevenue>> {
        let (year, month) = validate_weekly(year, month)?;
        let conn = self.provider.get().await?;
        timeseries::weekly(&conn, Fact::Purchasing, year, month).await
    }

    /// Fixed cap applied to every ranking operation.
    pub fn ranking_limit(&self) -> i64 {
        TOP_N
    }
}

/// Weekly drill-down requires both scope parameters.
fn validate_weekly(year: Option<i32>, month: Option<u32>) -> Result<(i32, i32)> {
    let year = year.ok_or(Error::MissingParam { name: "year" })?;
    let month = month.ok_or(Error::MissingParam { name: "month" })?;
    if !(1..=12).contains(&month) {
        return Err(Error::InvalidParam {
            name: "month",
            reason: format!("{month} is not a calendar month (1-12)"),
        });
    }
    Ok((year, month as i32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekly_requires_year_and_month() {
        assert!(matches!(
            validate_weekly(None, Some(3)),
            Err(Error::MissingParam { name: "year" })
        ));
        assert!(matches!(
            validate_weekly(Some(2024), None),
            Err(Error::MissingParam { name: "month" })
        ));
        assert_eq!(validate_weekly(Some(2024), Some(3)).unwrap(), (2024, 3));
    }

    #[test]
    fn test_weekly_month_must_be_a_calendar_month() {
        assert!(matches!(
            validate_weekly(Some(2024), Some(0)),
            Err(Error::InvalidParam { name: "month", .. })
        ));
        assert!(matches!(
            validate_weekly(Some(2024), Some(13)),
            Err(Error::InvalidParam { name: "month", .. })
        ));
    }

    #[test]
    fn test_validation_errors_are_distinguishable() {
        let err = validate_weekly(None, None).unwrap_err();
        assert!(err.is_validation());
    }
}
