// GraphQL documents understood by the content API

/// A named GraphQL document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    pub document: &'static str,
}

pub const CATEGORIES: Operation = Operation {
    name: "Category",
    document: r#"
query Category {
  categories {
    id
    name
    slug
    icon { url }
  }
}"#,
};

pub const MENU_ITEMS_BY_CATEGORY: Operation = Operation {
    name: "GetMenuItemsByCategory",
    document: r#"
query GetMenuItemsByCategory($slug: String!) {
  menuitems(where: { category_some: { slug: $slug } }) {
    id
    name
    price
    description
    img { url }
  }
}"#,
};

pub const CREATE_CART_ITEM: Operation = Operation {
    name: "CreateUserCart",
    document: r#"
mutation CreateUserCart($email: String!, $image: String, $itemname: String!, $price: Float!) {
  createUsercart(data: { email: $email, image: $image, itemname: $itemname, price: $price }) {
    id
  }
}"#,
};

pub const PUBLISH_CART_ITEM: Operation = Operation {
    name: "PublishUserCart",
    document: r#"
mutation PublishUserCart($id: ID!) {
  publishUsercart(where: { id: $id }) {
    id
  }
}"#,
};

pub const CART_BY_OWNER: Operation = Operation {
    name: "GetUserCart",
    document: r#"
query GetUserCart($email: String!) {
  usercarts(where: { email: $email }) {
    id
    email
    image
    itemname
    price
  }
}"#,
};

pub const DELETE_CART_ITEM: Operation = Operation {
    name: "DeleteCartItem",
    document: r#"
mutation DeleteCartItem($id: ID!) {
  deleteUsercart(where: { id: $id }) {
    id
  }
}"#,
};

pub const PUBLISH_CART_ITEMS: Operation = Operation {
    name: "PublishManyUserCarts",
    document: r#"
mutation PublishManyUserCarts($ids: [ID!]!) {
  publishManyUsercarts(where: { id_in: $ids }, to: PUBLISHED) {
    count
  }
}"#,
};

pub const CREATE_ORDER: Operation = Operation {
    name: "CreateUserOrder",
    document: r#"
mutation CreateUserOrder(
  $useremail: String!
  $username: String!
  $total: Float!
  $subtotal: Float!
  $gst: Float!
  $deliveryfee: Float!
  $discount: Float!
  $couponcode: String
  $phonenumber: String!
  $orderdate: DateTime!
  $paymentmode: String!
  $paymentid: String
  $status: String!
  $items: String!
  $address: String!
) {
  createUserOrder(
    data: {
      useremail: $useremail
      username: $username
      total: $total
      subtotal: $subtotal
      gst: $gst
      deliveryfee: $deliveryfee
      discount: $discount
      couponcode: $couponcode
      phonenumber: $phonenumber
      orderdate: $orderdate
      paymentmode: $paymentmode
      paymentid: $paymentid
      status: $status
      items: $items
      address: $address
    }
  ) {
    id
  }
}"#,
};

pub const PUBLISH_ORDER: Operation = Operation {
    name: "PublishUserOrder",
    document: r#"
mutation PublishUserOrder($id: ID!) {
  publishUserOrder(where: { id: $id }, to: PUBLISHED) {
    id
  }
}"#,
};

pub const ORDERS_BY_OWNER: Operation = Operation {
    name: "GetUserOrders",
    document: r#"
query GetUserOrders($email: String!) {
  userOrders(where: { useremail: $email }, orderBy: orderdate_DESC) {
    id
    useremail
    username
    total
    subtotal
    gst
    deliveryfee
    discount
    couponcode
    phonenumber
    orderdate
    paymentmode
    paymentid
    status
    items
    address
  }
}"#,
};

/// Same selection without `orderBy`, for schemas that reject the sort
pub const ORDERS_BY_OWNER_UNORDERED: Operation = Operation {
    name: "GetUserOrdersUnordered",
    document: r#"
query GetUserOrdersUnordered($email: String!) {
  userOrders(where: { useremail: $email }) {
    id
    useremail
    username
    total
    subtotal
    gst
    deliveryfee
    discount
    couponcode
    phonenumber
    orderdate
    paymentmode
    paymentid
    status
    items
    address
  }
}"#,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_declare_their_operation_name() {
        let all = [
            CATEGORIES,
            MENU_ITEMS_BY_CATEGORY,
            CREATE_CART_ITEM,
            PUBLISH_CART_ITEM,
            CART_BY_OWNER,
            DELETE_CART_ITEM,
            PUBLISH_CART_ITEMS,
            CREATE_ORDER,
            PUBLISH_ORDER,
            ORDERS_BY_OWNER,
            ORDERS_BY_OWNER_UNORDERED,
        ];
        for op in all {
            let header = format!(" {}(", op.name);
            let bare = format!(" {} {{", op.name);
            assert!(
                op.document.contains(&header) || op.document.contains(&bare),
                "document for {} does not declare it",
                op.name
            );
        }
    }
}
