//! Demo database for the SQL agent
//!
//! A small e-commerce schema (categories, customers, products, orders and
//! their line items) with sample rows, for trying the SQL agent without a
//! database of your own. Seeding drops and recreates the database.

use anyhow::{bail, Result};
use tracing::info;

use crate::provision::database::{quote_literal, validate_identifier, DatabaseAdmin, MySqlTarget};

/// Database seeded when no name is given
pub const DEFAULT_DEMO_DATABASE: &str = "ecommerce_db";

const CREATE_CATEGORIES: &str = "CREATE TABLE categories (
    category_id INT PRIMARY KEY AUTO_INCREMENT,
    category_name VARCHAR(100) NOT NULL UNIQUE,
    description TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

const CREATE_CUSTOMERS: &str = "CREATE TABLE customers (
    customer_id INT PRIMARY KEY AUTO_INCREMENT,
    first_name VARCHAR(50) NOT NULL,
    last_name VARCHAR(50) NOT NULL,
    email VARCHAR(100) UNIQUE NOT NULL,
    phone VARCHAR(20),
    date_of_birth DATE,
    registration_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    is_active BOOLEAN DEFAULT TRUE,
    total_orders INT DEFAULT 0,
    lifetime_value DECIMAL(10,2) DEFAULT 0.00
)";

const CREATE_PRODUCTS: &str = "CREATE TABLE products (
    product_id INT PRIMARY KEY AUTO_INCREMENT,
    product_name VARCHAR(200) NOT NULL,
    category_id INT,
    price DECIMAL(10,2) NOT NULL,
    stock_quantity INT DEFAULT 0,
    description TEXT,
    is_active BOOLEAN DEFAULT TRUE,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
    FOREIGN KEY (category_id) REFERENCES categories(category_id)
)";

const CREATE_ORDERS: &str = "CREATE TABLE orders (
    order_id INT PRIMARY KEY AUTO_INCREMENT,
    customer_id INT NOT NULL,
    order_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    total_amount DECIMAL(10,2) NOT NULL,
    status ENUM('pending', 'processing', 'shipped', 'delivered', 'cancelled') DEFAULT 'pending',
    shipping_address TEXT,
    FOREIGN KEY (customer_id) REFERENCES customers(customer_id)
)";

const CREATE_ORDER_ITEMS: &str = "CREATE TABLE order_items (
    order_item_id INT PRIMARY KEY AUTO_INCREMENT,
    order_id INT NOT NULL,
    product_id INT NOT NULL,
    quantity INT NOT NULL,
    unit_price DECIMAL(10,2) NOT NULL,
    total_price DECIMAL(10,2) NOT NULL,
    FOREIGN KEY (order_id) REFERENCES orders(order_id) ON DELETE CASCADE,
    FOREIGN KEY (product_id) REFERENCES products(product_id)
)";

/// (name, description)
const CATEGORIES: [(&str, &str); 5] = [
    ("Electronics", "Electronic devices and gadgets"),
    ("Clothing", "Fashion and apparel"),
    ("Books", "Books and literature"),
    ("Home & Garden", "Home improvement and gardening"),
    ("Sports", "Sports equipment and accessories"),
];

/// (first name, last name, email, phone, date of birth)
const CUSTOMERS: [(&str, &str, &str, &str, &str); 8] = [
    ("John", "Doe", "john.doe@email.com", "555-0101", "1985-03-15"),
    ("Jane", "Smith", "jane.smith@email.com", "555-0102", "1990-07-22"),
    ("Michael", "Johnson", "michael.j@email.com", "555-0103", "1982-11-08"),
    ("Emily", "Brown", "emily.brown@email.com", "555-0104", "1988-01-30"),
    ("David", "Wilson", "david.wilson@email.com", "555-0105", "1975-09-12"),
    ("Sarah", "Davis", "sarah.davis@email.com", "555-0106", "1992-04-18"),
    ("Robert", "Miller", "robert.miller@email.com", "555-0107", "1978-12-05"),
    ("Lisa", "Anderson", "lisa.anderson@email.com", "555-0108", "1986-06-25"),
];

/// (name, category id, price, stock, description)
const PRODUCTS: [(&str, u32, &str, u32, &str); 13] = [
    ("iPhone 15", 1, "999.99", 50, "Latest Apple smartphone"),
    ("Samsung Galaxy S24", 1, "899.99", 30, "Android flagship phone"),
    ("MacBook Pro", 1, "1999.99", 15, "Professional laptop"),
    ("Wireless Headphones", 1, "199.99", 100, "Noise-cancelling headphones"),
    ("Blue Jeans", 2, "79.99", 200, "Classic denim jeans"),
    ("Cotton T-Shirt", 2, "24.99", 300, "Comfortable cotton tee"),
    ("Winter Jacket", 2, "149.99", 75, "Warm winter outerwear"),
    ("Python Programming", 3, "45.99", 25, "Learn Python programming"),
    ("Data Science Handbook", 3, "59.99", 20, "Complete guide to data science"),
    ("Garden Tools Set", 4, "129.99", 40, "Complete gardening toolkit"),
    ("Indoor Plant Pot", 4, "19.99", 150, "Decorative plant container"),
    ("Tennis Racket", 5, "89.99", 60, "Professional tennis racket"),
    ("Running Shoes", 5, "119.99", 80, "Comfortable running footwear"),
];

/// (customer id, order date, total, status, shipping address)
const ORDERS: [(u32, &str, &str, &str, &str); 7] = [
    (1, "2024-01-15 10:30:00", "1199.98", "delivered", "123 Main St, City, State"),
    (2, "2024-01-20 14:15:00", "104.98", "delivered", "456 Oak Ave, City, State"),
    (3, "2024-02-01 09:45:00", "2199.98", "shipped", "789 Pine Rd, City, State"),
    (4, "2024-02-05 16:20:00", "269.97", "processing", "321 Elm St, City, State"),
    (5, "2024-02-10 11:10:00", "149.98", "pending", "654 Maple Dr, City, State"),
    (1, "2024-02-15 13:30:00", "45.99", "delivered", "123 Main St, City, State"),
    (6, "2024-02-20 15:45:00", "89.99", "shipped", "987 Cedar Ln, City, State"),
];

/// (order id, product id, quantity, unit price, total price)
const ORDER_ITEMS: [(u32, u32, u32, &str, &str); 12] = [
    (1, 1, 1, "999.99", "999.99"),
    (1, 4, 1, "199.99", "199.99"),
    (2, 5, 1, "79.99", "79.99"),
    (2, 6, 1, "24.99", "24.99"),
    (3, 3, 1, "1999.99", "1999.99"),
    (3, 4, 1, "199.99", "199.99"),
    (4, 7, 1, "149.99", "149.99"),
    (4, 4, 1, "199.99", "199.99"),
    (4, 6, 1, "24.99", "24.99"),
    (5, 7, 1, "149.99", "149.99"),
    (6, 8, 1, "45.99", "45.99"),
    (7, 12, 1, "89.99", "89.99"),
];

/// One multi-row INSERT
fn insert(table: &str, columns: &[&str], rows: Vec<Vec<String>>) -> String {
    let values: Vec<String> = rows
        .into_iter()
        .map(|row| format!("({})", row.join(", ")))
        .collect();
    format!(
        "INSERT INTO {} ({}) VALUES {}",
        table,
        columns.join(", "),
        values.join(", ")
    )
}

/// Statements that recreate `database` with the demo schema and rows
pub fn demo_database_statements(database: &str) -> Result<Vec<String>> {
    validate_identifier("Database name", database)?;

    let mut statements = vec![
        format!("DROP DATABASE IF EXISTS {}", database),
        format!("CREATE DATABASE {}", database),
        format!("USE {}", database),
    ];
    statements.extend(
        [
            CREATE_CATEGORIES,
            CREATE_CUSTOMERS,
            CREATE_PRODUCTS,
            CREATE_ORDERS,
            CREATE_ORDER_ITEMS,
        ]
        .map(str::to_string),
    );

    let text = quote_literal;
    statements.push(insert(
        "categories",
        &["category_name", "description"],
        CATEGORIES
            .iter()
            .map(|(name, description)| vec![text(name), text(description)])
            .collect(),
    ));
    statements.push(insert(
        "customers",
        &["first_name", "last_name", "email", "phone", "date_of_birth"],
        CUSTOMERS
            .iter()
            .map(|(first, last, email, phone, born)| {
                vec![text(first), text(last), text(email), text(phone), text(born)]
            })
            .collect(),
    ));
    statements.push(insert(
        "products",
        &["product_name", "category_id", "price", "stock_quantity", "description"],
        PRODUCTS
            .iter()
            .map(|(name, category, price, stock, description)| {
                vec![
                    text(name),
                    category.to_string(),
                    price.to_string(),
                    stock.to_string(),
                    text(description),
                ]
            })
            .collect(),
    ));
    statements.push(insert(
        "orders",
        &["customer_id", "order_date", "total_amount", "status", "shipping_address"],
        ORDERS
            .iter()
            .map(|(customer, date, total, status, address)| {
                vec![
                    customer.to_string(),
                    text(date),
                    total.to_string(),
                    text(status),
                    text(address),
                ]
            })
            .collect(),
    ));
    statements.push(insert(
        "order_items",
        &["order_id", "product_id", "quantity", "unit_price", "total_price"],
        ORDER_ITEMS
            .iter()
            .map(|(order, product, quantity, unit, total)| {
                vec![
                    order.to_string(),
                    product.to_string(),
                    quantity.to_string(),
                    unit.to_string(),
                    total.to_string(),
                ]
            })
            .collect(),
    ));

    if statements.iter().any(|s| s.contains('\\')) {
        bail!("Demo data may not contain backslashes");
    }
    Ok(statements)
}

/// Drop and recreate `target.database` with the demo schema and rows.
///
/// Returns the number of statements run.
pub async fn seed_demo_database(admin: &dyn DatabaseAdmin, target: &MySqlTarget) -> Result<usize> {
    let statements = demo_database_statements(&target.database)?;
    info!(
        database = %target.database,
        host = %target.host,
        statements = statements.len(),
        "Seeding demo database"
    );
    admin.execute(target, &statements).await?;
    info!(database = %target.database, "Demo database ready");
    Ok(statements.len())
}
