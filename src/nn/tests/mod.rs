mod connection_propagate;
