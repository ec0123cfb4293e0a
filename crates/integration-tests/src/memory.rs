//! In-memory repositories.
//!
//! One mutex guards all tables, so every trait call is atomic. The payment
//! uniqueness rules match the `orders_gateway_payment_unique` constraint and
//! the catalog enforces the same unique slugs and SKUs as the schema.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use vitaforge_core::{
    AddressBook, AddressEdit, CategoryId, Email, OrderId, OrderStatus, PaymentStatus, ProductId,
    SavedAddress, UserId,
};
use vitaforge_storefront::db::{
    AddressBookError, CatalogRepository, OrderRepository, Page, PageRequest, RepositoryError,
    UserRepository,
};
use vitaforge_storefront::models::{
    AdminOrder, ApplyPayment, Category, InsertPaidOrder, NewCategory, NewOrder, NewPaidOrder,
    NewProduct, NewUser, Order, OrderCustomer, OrderFilter, OrderStatusUpdate, PaymentDetails,
    Product, ProductFilter, User,
};

#[derive(Default)]
struct Tables {
    users: Vec<(User, String)>,
    addresses: HashMap<UserId, Vec<SavedAddress>>,
    orders: Vec<Order>,
    products: Vec<Product>,
    categories: Vec<Category>,
    next_user_id: i32,
    next_order_id: i32,
    next_product_id: i32,
    next_category_id: i32,
}

impl Tables {
    fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().map(|(u, _)| u).find(|u| u.id == id)
    }

    fn order_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        self.orders.iter_mut().find(|o| o.id == id)
    }

    fn order_with_payment(&self, payment: &PaymentDetails) -> Option<&Order> {
        self.orders.iter().find(|o| {
            o.payment_details.as_ref().is_some_and(|d| {
                d.method == payment.method && d.transaction_id == payment.transaction_id
            })
        })
    }

    fn with_customer(&self, order: &Order) -> AdminOrder {
        AdminOrder {
            order: order.clone(),
            customer: self.user(order.user_id).map(|u| OrderCustomer {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
            }),
        }
    }

    fn insert_order(
        &mut self,
        order: &NewOrder,
        status: OrderStatus,
        payment_status: PaymentStatus,
        payment_details: Option<PaymentDetails>,
    ) -> Order {
        self.next_order_id += 1;
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(self.next_order_id),
            user_id: order.user_id,
            items: order.items.clone(),
            shipping_address: order.shipping_address.clone(),
            total_amount: order.total_amount,
            status,
            payment_status,
            payment_details,
            created_at: now,
            updated_at: now,
        };
        self.orders.push(order.clone());
        order
    }
}

/// All repository ports over shared in-memory tables.
#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

impl MemoryRepository {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every stored order, in insertion order.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.tables().orders.clone()
    }

    /// A stored order.
    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.tables().orders.iter().find(|o| o.id == id).cloned()
    }

    /// Stored orders paid by the given gateway payment.
    #[must_use]
    pub fn orders_for_payment(&self, payment_id: &str) -> Vec<Order> {
        self.tables()
            .orders
            .iter()
            .filter(|o| {
                o.payment_details
                    .as_ref()
                    .is_some_and(|d| d.transaction_id == payment_id)
            })
            .cloned()
            .collect()
    }

    /// Overwrite a saved address book without going through the invariant.
    pub fn set_addresses(&self, user_id: UserId, addresses: Vec<SavedAddress>) {
        self.tables().addresses.insert(user_id, addresses);
    }
}

fn paginate<T>(mut items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let items = if offset >= items.len() {
        Vec::new()
    } else {
        items
            .drain(offset..)
            .take(page.limit as usize)
            .collect()
    };
    Page {
        items,
        total,
        request: page,
    }
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables();
        if tables.users.iter().any(|(u, _)| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_string()));
        }

        tables.next_user_id += 1;
        let now = Utc::now();
        let created = User {
            id: UserId::new(tables.next_user_id),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables
            .users
            .push((created.clone(), user.password_hash.clone()));
        Ok(created)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables().user(id).cloned())
    }

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|(u, _)| &u.email == email)
            .cloned())
    }

    async fn update_name(&self, id: UserId, name: &str) -> Result<User, RepositoryError> {
        let mut tables = self.tables();
        let (user, _) = tables
            .users
            .iter_mut()
            .find(|(u, _)| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        name.clone_into(&mut user.name);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn addresses(&self, id: UserId) -> Result<Vec<SavedAddress>, RepositoryError> {
        Ok(self
            .tables()
            .addresses
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn edit_addresses(
        &self,
        id: UserId,
        edit: AddressEdit,
    ) -> Result<Vec<SavedAddress>, AddressBookError> {
        let mut tables = self.tables();
        if tables.user(id).is_none() {
            return Err(RepositoryError::NotFound.into());
        }

        let mut book =
            AddressBook::from_saved(tables.addresses.get(&id).cloned().unwrap_or_default());
        edit.apply(&mut book)?;
        let addresses = book.into_inner();
        tables.addresses.insert(id, addresses.clone());
        Ok(addresses)
    }
}

#[async_trait]
impl OrderRepository for MemoryRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        Ok(self
            .tables()
            .insert_order(order, OrderStatus::Pending, PaymentStatus::Pending, None))
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.order(id))
    }

    async fn get_with_customer(&self, id: OrderId) -> Result<Option<AdminOrder>, RepositoryError> {
        let tables = self.tables();
        Ok(tables
            .orders
            .iter()
            .find(|o| o.id == id)
            .map(|o| tables.with_customer(o)))
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self
            .tables()
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut orders);
        Ok(paginate(orders, page))
    }

    async fn list(
        &self,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<Page<AdminOrder>, RepositoryError> {
        let tables = self.tables();
        let mut orders: Vec<Order> = tables
            .orders
            .iter()
            .filter(|o| filter.status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        newest_first(&mut orders);
        let orders = orders.iter().map(|o| tables.with_customer(o)).collect();
        Ok(paginate(orders, page))
    }

    async fn update_status(
        &self,
        id: OrderId,
        update: OrderStatusUpdate,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tables = self.tables();
        let Some(order) = tables.order_mut(id) else {
            return Ok(None);
        };
        if let Some(status) = update.status {
            order.status = status;
        }
        if let Some(payment_status) = update.payment_status {
            order.payment_status = payment_status;
        }
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn apply_payment(
        &self,
        id: OrderId,
        payment: &PaymentDetails,
    ) -> Result<ApplyPayment, RepositoryError> {
        let mut tables = self.tables();
        let Some(order) = tables.orders.iter().find(|o| o.id == id) else {
            return Ok(ApplyPayment::NotFound);
        };
        if order.is_paid_by(&payment.method, &payment.transaction_id) {
            return Ok(ApplyPayment::AlreadyApplied(order.clone()));
        }
        if tables.order_with_payment(payment).is_some() {
            return Err(RepositoryError::Conflict("payment already exists".to_string()));
        }

        let Some(order) = tables.order_mut(id) else {
            return Ok(ApplyPayment::NotFound);
        };
        order.status = OrderStatus::Processing;
        order.payment_status = PaymentStatus::Paid;
        order.payment_details = Some(payment.clone());
        order.updated_at = Utc::now();
        Ok(ApplyPayment::Applied(order.clone()))
    }

    async fn insert_paid(&self, order: &NewPaidOrder) -> Result<InsertPaidOrder, RepositoryError> {
        let mut tables = self.tables();
        if let Some(existing) = tables.order_with_payment(&order.payment) {
            return Ok(InsertPaidOrder::Existing(existing.clone()));
        }

        let new_order = NewOrder {
            user_id: order.user_id,
            items: order.items.clone(),
            shipping_address: order.shipping_address.clone(),
            total_amount: order.total_amount,
        };
        Ok(InsertPaidOrder::Created(tables.insert_order(
            &new_order,
            OrderStatus::Processing,
            PaymentStatus::Paid,
            Some(order.payment.clone()),
        )))
    }
}

#[async_trait]
impl CatalogRepository for MemoryRepository {
    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        let mut products: Vec<Product> = self
            .tables()
            .products
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(products, page))
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables().products.iter().find(|p| p.id == id).cloned())
    }

    async fn list_categories(&self, active_only: bool) -> Result<Vec<Category>, RepositoryError> {
        let mut categories: Vec<Category> = self
            .tables()
            .categories
            .iter()
            .filter(|c| !active_only || c.is_active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.tables();
        let slug = product.slug();
        if tables
            .products
            .iter()
            .any(|p| p.slug == slug || p.sku == product.sku)
        {
            return Err(RepositoryError::Conflict(
                "product slug or sku already exists".to_owned(),
            ));
        }

        tables.next_product_id += 1;
        let now = Utc::now();
        let created = Product {
            id: ProductId::new(tables.next_product_id),
            name: product.name.clone(),
            slug,
            description: product.description.clone(),
            short_description: product.short_description.clone(),
            price: product.price,
            compare_at_price: product.compare_at_price,
            stock: product.stock,
            sku: product.sku.clone(),
            images: product.images.clone(),
            category: product.category.clone(),
            tags: product.tags.clone(),
            ingredients: product.ingredients.clone(),
            nutritional_info: product.nutritional_info.clone(),
            featured: product.featured,
            is_active: product.is_active,
            created_at: now,
            updated_at: now,
        };
        tables.products.push(created.clone());
        Ok(created)
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, RepositoryError> {
        let mut tables = self.tables();
        let slug = category.slug();
        if tables
            .categories
            .iter()
            .any(|c| c.slug == slug || c.name == category.name)
        {
            return Err(RepositoryError::Conflict("category already exists".to_owned()));
        }

        tables.next_category_id += 1;
        let now = Utc::now();
        let created = Category {
            id: CategoryId::new(tables.next_category_id),
            name: category.name.clone(),
            slug,
            description: category.description.clone(),
            image: category.image.clone(),
            is_active: category.is_active,
            created_at: now,
            updated_at: now,
        };
        tables.categories.push(created.clone());
        Ok(created)
    }
}
