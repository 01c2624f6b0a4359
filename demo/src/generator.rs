use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, TimestampMillisecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{Days, NaiveDate, Utc};
use common::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

const COUNTRIES: &[(&str, &str)] = &[
    ("US", "USD"),
    ("UK", "GBP"),
    ("DE", "EUR"),
    ("FR", "EUR"),
    ("IT", "EUR"),
    ("ES", "EUR"),
    ("NL", "EUR"),
    ("CA", "CAD"),
    ("AU", "AUD"),
    ("JP", "JPY"),
    ("CN", "CNY"),
    ("IN", "INR"),
];

const SEGMENTS: &[&str] = &["Bronze", "Silver", "Gold", "Platinum"];

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
    "Charles", "Karen",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Taylor",
];

const CITIES: &[&str] = &[
    "London", "Manchester", "Berlin", "Paris", "Madrid", "Amsterdam", "Toronto", "Sydney",
    "Tokyo", "Shanghai", "Mumbai", "Chicago", "Austin", "Rotterdam", "Lyon", "Milan",
];

// Category, price range, margin.
const CATEGORIES: &[(&str, (f64, f64), f64)] = &[
    ("Electronics", (10.0, 2000.0), 0.3),
    ("Clothing", (15.0, 500.0), 0.4),
    ("Books", (5.0, 100.0), 0.5),
    ("Home & Garden", (20.0, 800.0), 0.35),
    ("Sports", (25.0, 600.0), 0.4),
    ("Beauty", (8.0, 200.0), 0.45),
];

const SUBCATEGORIES: &[(&str, &[&str])] = &[
    ("Electronics", &["Audio", "Computing", "Gaming", "Mobile", "Wearables"]),
    ("Clothing", &["Tops", "Bottoms", "Outerwear", "Footwear", "Accessories"]),
    ("Books", &["Fiction", "Non-Fiction", "Educational", "Reference", "Biography"]),
    ("Home & Garden", &["Furniture", "Decor", "Kitchen", "Garden", "Lighting"]),
    ("Sports", &["Team Sports", "Individual Sports", "Fitness", "Outdoor", "Water Sports"]),
    ("Beauty", &["Skincare", "Haircare", "Makeup", "Fragrance", "Nails"]),
];

const PRODUCT_ADJECTIVES: &[&str] = &[
    "Wireless", "Smart", "Classic", "Premium", "Portable", "Professional", "Compact", "Luxury",
    "Modern", "Organic", "Athletic", "Vintage",
];

const PRODUCT_ITEMS: &[(&str, &[&str])] = &[
    ("Electronics", &["Headphones", "Speaker", "Mouse", "Keyboard", "Monitor", "Tablet"]),
    ("Clothing", &["T-Shirt", "Jeans", "Jacket", "Dress", "Shoes", "Scarf"]),
    ("Books", &["Programming Guide", "Cookbook", "Photography Handbook", "History Atlas"]),
    ("Home & Garden", &["Lamp", "Chair", "Table", "Planter", "Storage Box"]),
    ("Sports", &["Ball", "Racket", "Helmet", "Jersey", "Gloves"]),
    ("Beauty", &["Cream", "Serum", "Mask", "Lotion", "Shampoo"]),
];

const BRANDS: &[&str] = &[
    "Northwind", "Acme Supply", "Bluebird Goods", "Crestline", "Harbor & Co", "Juniper Labs",
    "Redwood Trading", "Stellar Works",
];

const ORDER_STATUSES: &[&str] = &["Completed", "Shipped", "Processing", "Cancelled"];

const PAYMENT_METHODS: &[&str] = &["Credit Card", "PayPal", "Bank Transfer", "Cash on Delivery"];

// Approximate real-world rates against USD.
const FX_BASE_RATES: &[(&str, f64)] = &[
    ("GBP", 0.75),
    ("EUR", 0.85),
    ("CAD", 1.25),
    ("AUD", 1.35),
    ("JPY", 110.0),
    ("CNY", 6.45),
    ("INR", 74.5),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    Small,
    Medium,
    Large,
}

impl Scale {
    /// (customers, products, orders)
    fn counts(self) -> (usize, usize, usize) {
        match self {
            Scale::Small => (1_000, 500, 5_000),
            Scale::Medium => (10_000, 5_000, 50_000),
            Scale::Large => (50_000, 25_000, 250_000),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scale::Small => "small",
            Scale::Medium => "medium",
            Scale::Large => "large",
        }
    }
}

impl FromStr for Scale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "small" => Ok(Scale::Small),
            "medium" => Ok(Scale::Medium),
            "large" => Ok(Scale::Large),
            other => Err(Error::InvalidInput(format!(
                "Unknown scale '{}', expected small, medium or large",
                other
            ))),
        }
    }
}

/// One synthetic dataset, ready to encode and upload table by table.
pub struct Dataset {
    pub customers: RecordBatch,
    pub products: RecordBatch,
    pub orders: RecordBatch,
    pub fx_rates: RecordBatch,
}

impl Dataset {
    pub fn tables(&self) -> [(&'static str, &RecordBatch); 4] {
        [
            ("customers", &self.customers),
            ("products", &self.products),
            ("orders", &self.orders),
            ("fx_rates", &self.fx_rates),
        ]
    }
}

struct CustomerRow {
    id: String,
    currency: String,
}

struct ProductRow {
    id: String,
    sale_price: f64,
}

/// Seeded synthetic e-commerce data. A fixed seed and anchor date yield an
/// identical dataset on every run.
pub struct EcommerceDataGenerator {
    rng: StdRng,
    anchor: NaiveDate,
}

impl EcommerceDataGenerator {
    pub fn new(seed: u64) -> Self {
        Self::with_anchor(seed, Utc::now().date_naive())
    }

    pub fn with_anchor(seed: u64, anchor: NaiveDate) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            anchor,
        }
    }

    pub fn generate_all(&mut self, scale: Scale) -> Result<Dataset> {
        let (n_customers, n_products, n_orders) = scale.counts();
        info!(
            scale = scale.as_str(),
            customers = n_customers,
            products = n_products,
            orders = n_orders,
            "Generating dataset"
        );

        let (customers, customer_rows) = self.generate_customers(n_customers)?;
        let (products, product_rows) = self.generate_products(n_products)?;
        let fx_rates = self.generate_fx_rates(365)?;
        let orders = self.generate_orders(&customer_rows, &product_rows, n_orders)?;

        Ok(Dataset {
            customers,
            products,
            orders,
            fx_rates,
        })
    }

    fn generate_customers(&mut self, n: usize) -> Result<(RecordBatch, Vec<CustomerRow>)> {
        let mut ids = Vec::with_capacity(n);
        let mut names = Vec::with_capacity(n);
        let mut emails = Vec::with_capacity(n);
        let mut cities = Vec::with_capacity(n);
        let mut countries = Vec::with_capacity(n);
        let mut currencies = Vec::with_capacity(n);
        let mut registered = Vec::with_capacity(n);
        let mut segments = Vec::with_capacity(n);
        let mut total_orders = Vec::with_capacity(n);
        let mut total_spent = Vec::with_capacity(n);
        let mut rows = Vec::with_capacity(n);

        for index in 0..n {
            let first = pick(&mut self.rng, FIRST_NAMES);
            let last = pick(&mut self.rng, LAST_NAMES);
            let (country, currency) = *pick(&mut self.rng, COUNTRIES);

            let id = format!("CUST_{:06}", index + 1);
            ids.push(id.clone());
            names.push(format!("{} {}", first, last));
            emails.push(format!(
                "{}.{}{}@example.com",
                first.to_lowercase(),
                last.to_lowercase(),
                index + 1
            ));
            cities.push(pick(&mut self.rng, CITIES).to_string());
            countries.push(country.to_string());
            currencies.push(currency.to_string());
            registered.push(self.days_ago_millis(730));
            segments.push(pick(&mut self.rng, SEGMENTS).to_string());
            total_orders.push(self.rng.random_range(0..50_i64));
            total_spent.push(round2(self.rng.random_range(0.0..10_000.0)));

            rows.push(CustomerRow {
                id,
                currency: currency.to_string(),
            });
        }

        let schema = Arc::new(Schema::new(vec![
            Field::new("customer_id", DataType::Utf8, false),
            Field::new("customer_name", DataType::Utf8, false),
            Field::new("email", DataType::Utf8, false),
            Field::new("city", DataType::Utf8, false),
            Field::new("country", DataType::Utf8, false),
            Field::new("currency", DataType::Utf8, false),
            timestamp_field("registration_date"),
            Field::new("segment", DataType::Utf8, false),
            Field::new("total_orders", DataType::Int64, false),
            Field::new("total_spent", DataType::Float64, false),
        ]));

        let batch = RecordBatch::try_new(
            schema,
            vec![
                string_array(ids),
                string_array(names),
                string_array(emails),
                string_array(cities),
                string_array(countries),
                string_array(currencies),
                Arc::new(TimestampMillisecondArray::from(registered)),
                string_array(segments),
                Arc::new(Int64Array::from(total_orders)),
                Arc::new(Float64Array::from(total_spent)),
            ],
        )?;

        Ok((batch, rows))
    }

    fn generate_products(&mut self, n: usize) -> Result<(RecordBatch, Vec<ProductRow>)> {
        let mut ids = Vec::with_capacity(n);
        let mut names = Vec::with_capacity(n);
        let mut categories = Vec::with_capacity(n);
        let mut subcategories = Vec::with_capacity(n);
        let mut brands = Vec::with_capacity(n);
        let mut base_prices = Vec::with_capacity(n);
        let mut sale_prices = Vec::with_capacity(n);
        let mut cost_prices = Vec::with_capacity(n);
        let mut stock = Vec::with_capacity(n);
        let mut active = Vec::with_capacity(n);
        let mut created = Vec::with_capacity(n);
        let mut rows = Vec::with_capacity(n);

        for index in 0..n {
            let category_index = self.rng.random_range(0..CATEGORIES.len());
            let (category, (low, high), margin) = CATEGORIES[category_index];
            let base_price = self.rng.random_range(low..high);
            // Some discounts, some markups.
            let sale_price = round2(base_price * (1.0 + self.rng.random_range(-0.3..0.1)));

            let adjective = pick(&mut self.rng, PRODUCT_ADJECTIVES);
            let item = pick(&mut self.rng, PRODUCT_ITEMS[category_index].1);

            let id = format!("PROD_{:06}", index + 1);
            ids.push(id.clone());
            names.push(format!("{} {}", adjective, item));
            categories.push(category.to_string());
            subcategories.push(pick(&mut self.rng, SUBCATEGORIES[category_index].1).to_string());
            brands.push(pick(&mut self.rng, BRANDS).to_string());
            base_prices.push(round2(base_price));
            sale_prices.push(sale_price);
            cost_prices.push(round2(base_price * (1.0 - margin)));
            stock.push(self.rng.random_range(0..1_000_i64));
            active.push(self.rng.random_bool(0.95));
            created.push(self.days_ago_millis(365));

            rows.push(ProductRow { id, sale_price });
        }

        let schema = Arc::new(Schema::new(vec![
            Field::new("product_id", DataType::Utf8, false),
            Field::new("product_name", DataType::Utf8, false),
            Field::new("category", DataType::Utf8, false),
            Field::new("subcategory", DataType::Utf8, false),
            Field::new("brand", DataType::Utf8, false),
            Field::new("base_price", DataType::Float64, false),
            Field::new("sale_price", DataType::Float64, false),
            Field::new("cost_price", DataType::Float64, false),
            Field::new("stock_quantity", DataType::Int64, false),
            Field::new("is_active", DataType::Boolean, false),
            timestamp_field("created_date"),
        ]));

        let batch = RecordBatch::try_new(
            schema,
            vec![
                string_array(ids),
                string_array(names),
                string_array(categories),
                string_array(subcategories),
                string_array(brands),
                Arc::new(Float64Array::from(base_prices)),
                Arc::new(Float64Array::from(sale_prices)),
                Arc::new(Float64Array::from(cost_prices)),
                Arc::new(Int64Array::from(stock)),
                Arc::new(BooleanArray::from(active)),
                Arc::new(TimestampMillisecondArray::from(created)),
            ],
        )?;

        Ok((batch, rows))
    }

    fn generate_fx_rates(&mut self, days: u64) -> Result<RecordBatch> {
        let capacity = days as usize * FX_BASE_RATES.len();
        let mut dates = Vec::with_capacity(capacity);
        let mut currencies = Vec::with_capacity(capacity);
        let mut to_usd = Vec::with_capacity(capacity);
        let mut from_usd = Vec::with_capacity(capacity);

        let start = self
            .anchor
            .checked_sub_days(Days::new(days))
            .ok_or_else(|| Error::InvalidInput("FX window precedes the calendar".to_string()))?;

        for offset in 0..days {
            let date = start
                .checked_add_days(Days::new(offset))
                .ok_or_else(|| Error::InvalidInput("FX window overflows the calendar".to_string()))?;
            let millis = date
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp_millis())
                .unwrap_or_default();

            for (currency, base_rate) in FX_BASE_RATES {
                // Daily volatility of +/- 5% around the base rate.
                let rate = base_rate * (1.0 + self.rng.random_range(-0.05..0.05));
                dates.push(millis);
                currencies.push(currency.to_string());
                to_usd.push(round4(rate));
                from_usd.push(round4(1.0 / rate));
            }
        }

        let schema = Arc::new(Schema::new(vec![
            timestamp_field("date"),
            Field::new("currency", DataType::Utf8, false),
            Field::new("rate_to_usd", DataType::Float64, false),
            Field::new("usd_to_currency", DataType::Float64, false),
        ]));

        Ok(RecordBatch::try_new(
            schema,
            vec![
                Arc::new(TimestampMillisecondArray::from(dates)),
                string_array(currencies),
                Arc::new(Float64Array::from(to_usd)),
                Arc::new(Float64Array::from(from_usd)),
            ],
        )?)
    }

    fn generate_orders(
        &mut self,
        customers: &[CustomerRow],
        products: &[ProductRow],
        n: usize,
    ) -> Result<RecordBatch> {
        if customers.is_empty() || products.is_empty() {
            return Err(Error::InvalidInput(
                "Orders need at least one customer and one product".to_string(),
            ));
        }

        let mut ids = Vec::with_capacity(n);
        let mut customer_ids = Vec::with_capacity(n);
        let mut order_dates = Vec::with_capacity(n);
        let mut statuses = Vec::with_capacity(n);
        let mut payments = Vec::with_capacity(n);
        let mut currencies = Vec::with_capacity(n);
        let mut subtotals = Vec::with_capacity(n);
        let mut taxes = Vec::with_capacity(n);
        let mut shipping = Vec::with_capacity(n);
        let mut totals = Vec::with_capacity(n);
        let mut item_counts = Vec::with_capacity(n);

        for index in 0..n {
            let customer = &customers[self.rng.random_range(0..customers.len())];

            // Quadratic skew so recent days carry more orders.
            let skew: f64 = self.rng.random();
            let days_back = (skew * skew * 365.0) as u64;

            let item_count = self.rng.random_range(1..=10_i64);
            let mut subtotal = 0.0;
            for _ in 0..item_count {
                let product = &products[self.rng.random_range(0..products.len())];
                let quantity = self.rng.random_range(1..=5) as f64;
                let discount = if self.rng.random_bool(0.3) {
                    self.rng.random_range(0.0..0.2)
                } else {
                    0.0
                };
                subtotal += product.sale_price * quantity * (1.0 - discount);
            }
            let subtotal = round2(subtotal);
            let tax = round2(subtotal * 0.08);
            let shipping_cost = round2(self.rng.random_range(0.0..50.0));

            ids.push(format!("ORD_{:08}", index + 1));
            customer_ids.push(customer.id.clone());
            order_dates.push(self.days_ago_exact_millis(days_back));
            statuses.push(pick(&mut self.rng, ORDER_STATUSES).to_string());
            payments.push(pick(&mut self.rng, PAYMENT_METHODS).to_string());
            currencies.push(customer.currency.clone());
            subtotals.push(subtotal);
            taxes.push(tax);
            shipping.push(shipping_cost);
            totals.push(round2(subtotal + tax + shipping_cost));
            item_counts.push(item_count);
        }

        let schema = Arc::new(Schema::new(vec![
            Field::new("order_id", DataType::Utf8, false),
            Field::new("customer_id", DataType::Utf8, false),
            timestamp_field("order_date"),
            Field::new("order_status", DataType::Utf8, false),
            Field::new("payment_method", DataType::Utf8, false),
            Field::new("currency", DataType::Utf8, false),
            Field::new("subtotal", DataType::Float64, false),
            Field::new("tax_amount", DataType::Float64, false),
            Field::new("shipping_cost", DataType::Float64, false),
            Field::new("total_amount", DataType::Float64, false),
            Field::new("item_count", DataType::Int64, false),
        ]));

        Ok(RecordBatch::try_new(
            schema,
            vec![
                string_array(ids),
                string_array(customer_ids),
                Arc::new(TimestampMillisecondArray::from(order_dates)),
                string_array(statuses),
                string_array(payments),
                string_array(currencies),
                Arc::new(Float64Array::from(subtotals)),
                Arc::new(Float64Array::from(taxes)),
                Arc::new(Float64Array::from(shipping)),
                Arc::new(Float64Array::from(totals)),
                Arc::new(Int64Array::from(item_counts)),
            ],
        )?)
    }

    /// Midnight of a uniformly random day within the window, as epoch millis.
    fn days_ago_millis(&mut self, window_days: u64) -> i64 {
        let days_back = self.rng.random_range(0..window_days);
        self.days_ago_exact_millis(days_back)
    }

    fn days_ago_exact_millis(&mut self, days_back: u64) -> i64 {
        self.anchor
            .checked_sub_days(Days::new(days_back))
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default()
    }
}

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    &items[rng.random_range(0..items.len())]
}

fn string_array(values: Vec<String>) -> ArrayRef {
    Arc::new(StringArray::from(values))
}

fn timestamp_field(name: &str) -> Field {
    Field::new(
        name,
        DataType::Timestamp(TimeUnit::Millisecond, None),
        false,
    )
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::StringArray;

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn scale_parses_known_names_only() {
        assert_eq!("small".parse::<Scale>().unwrap(), Scale::Small);
        assert_eq!("large".parse::<Scale>().unwrap(), Scale::Large);
        assert!("galactic".parse::<Scale>().is_err());
    }

    #[test]
    fn small_scale_produces_the_expected_row_counts() {
        let mut generator = EcommerceDataGenerator::with_anchor(42, anchor());
        let dataset = generator.generate_all(Scale::Small).unwrap();

        assert_eq!(dataset.customers.num_rows(), 1_000);
        assert_eq!(dataset.products.num_rows(), 500);
        assert_eq!(dataset.orders.num_rows(), 5_000);
        assert_eq!(dataset.fx_rates.num_rows(), 365 * FX_BASE_RATES.len());
    }

    #[test]
    fn fixed_seed_and_anchor_are_deterministic() {
        let mut first = EcommerceDataGenerator::with_anchor(7, anchor());
        let mut second = EcommerceDataGenerator::with_anchor(7, anchor());

        let a = first.generate_all(Scale::Small).unwrap();
        let b = second.generate_all(Scale::Small).unwrap();

        assert_eq!(a.customers, b.customers);
        assert_eq!(a.products, b.products);
        assert_eq!(a.orders, b.orders);
        assert_eq!(a.fx_rates, b.fx_rates);
    }

    #[test]
    fn orders_reference_generated_customers() {
        let mut generator = EcommerceDataGenerator::with_anchor(42, anchor());
        let dataset = generator.generate_all(Scale::Small).unwrap();

        let customer_ids: std::collections::HashSet<String> = dataset
            .customers
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap()
            .iter()
            .flatten()
            .map(str::to_string)
            .collect();

        let order_customers = dataset
            .orders
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        for index in 0..dataset.orders.num_rows() {
            assert!(customer_ids.contains(order_customers.value(index)));
        }
    }

    #[test]
    fn table_names_cover_all_four_batches() {
        let mut generator = EcommerceDataGenerator::with_anchor(1, anchor());
        let dataset = generator.generate_all(Scale::Small).unwrap();

        let names: Vec<&str> = dataset.tables().iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["customers", "products", "orders", "fx_rates"]);
    }
}
