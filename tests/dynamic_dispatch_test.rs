use lite_checkout::domain::money::Price;
use lite_checkout::domain::order::Order;
use lite_checkout::domain::payment::{NewPayment, PaymentState};
use lite_checkout::domain::ports::{OrderStoreBox, PaymentStoreBox};
use lite_checkout::infrastructure::in_memory::{InMemoryOrderStore, InMemoryPaymentStore};
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_stores_as_trait_objects() {
    let order_store: OrderStoreBox = Box::new(InMemoryOrderStore::new());
    let payment_store: PaymentStoreBox = Box::new(InMemoryPaymentStore::new());

    let order = Order::new("1", Price::new(dec!(100.00), "ZAR"));
    let new_payment = NewPayment {
        order_id: "1".to_string(),
        amount: Price::new(dec!(100.00), "ZAR"),
        state: PaymentState::Authorization,
        remote_id: "TX-1".to_string(),
        remote_state: "0".to_string(),
        return_message: String::new(),
    };

    // Verify Send + Sync by spawning tasks
    let os_handle = tokio::spawn(async move {
        order_store.save(order).await.unwrap();
        order_store.get("1").await.unwrap().unwrap()
    });

    let ps_handle = tokio::spawn(async move {
        let created = payment_store.create(new_payment).await.unwrap();
        let found = payment_store.find_by_remote_id("TX-1").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        payment_store.find_by_order("1").await.unwrap().unwrap()
    });

    let retrieved_order = os_handle.await.unwrap();
    assert_eq!(retrieved_order.id, "1");

    let retrieved_payment = ps_handle.await.unwrap();
    assert_eq!(retrieved_payment.state, PaymentState::Authorization);
}
