/// Server-side script that inserts every element of its single array argument
/// in turn and reports how many documents it created.
///
/// Executed by the document database, never by this process.
pub const BULK_INSERT_PROCEDURE: &str = r#"function insertItems(items) {
    var context = getContext();
    var collection = context.getCollection();
    var response = context.getResponse();
    var count = 0;

    if (!items || items.length === 0) {
        response.setBody({ inserted: 0, message: "No items were provided." });
        return;
    }

    function tryCreate(item) {
        var accepted = collection.createDocument(collection.getSelfLink(), item, function (err) {
            if (err) throw new Error("Error inserting item: " + err.message);
            count++;

            if (count < items.length) {
                tryCreate(items[count]);
            } else {
                response.setBody({ inserted: count, message: "All items were inserted." });
            }
        });

        if (!accepted) {
            throw new Error("Insert request was not accepted after " + count + " items.");
        }
    }

    tryCreate(items[count]);
}"#;
